//! Configuration loading for classbox
//!
//! Settings are layered: embedded defaults, then an optional TOML file, then
//! `CLASSBOX_*` environment variables (double-underscore separator for
//! nested keys, e.g. `CLASSBOX_RATE_LIMITS__RUN__MAX_REQUESTS`).

use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, EXAMPLE_CONFIG};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "CLASSBOX";

impl Config {
    /// Load configuration from a file, with environment overrides on top
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(Some(path.as_ref()))
    }

    /// Load configuration from the embedded defaults and the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Parse configuration from a TOML string (no environment layering)
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .add_source(File::from_str(EXAMPLE_CONFIG, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_timeout <= 0.0 {
            return Err(ConfigError::Invalid(
                "execution_timeout must be positive".to_owned(),
            ));
        }
        if self.max_source_length == 0 {
            return Err(ConfigError::Invalid(
                "max_source_length must be positive".to_owned(),
            ));
        }
        if self.max_source_lines == 0 {
            return Err(ConfigError::Invalid(
                "max_source_lines must be positive".to_owned(),
            ));
        }
        if self.max_output_length == 0 {
            return Err(ConfigError::Invalid(
                "max_output_length must be positive".to_owned(),
            ));
        }
        for (endpoint, budget) in &self.rate_limits {
            if budget.max_requests == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rate limit for '{endpoint}' has zero max_requests"
                )));
            }
            if budget.window_seconds == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rate limit for '{endpoint}' has zero window_seconds"
                )));
            }
        }
        Ok(())
    }
}
