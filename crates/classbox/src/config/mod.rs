use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::sandbox::SandboxLimits;
use crate::validate::SourcePolicy;

mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file. It also
/// supplies the default values for every setting.
pub const EXAMPLE_CONFIG: &str = include_str!("../../classbox.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Admission budget for one endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub max_requests: u32,

    /// Trailing window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_seconds: 60,
        }
    }
}

/// Config for classbox
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Interpreter used to run submissions
    #[serde(default = "default_python_binary")]
    pub python_binary: PathBuf,

    /// Where execution units are created (system temp directory if unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Global kill switch: when false every request gets a system_error
    /// response without touching the sandbox
    #[serde(default = "default_execution_enabled")]
    pub execution_enabled: bool,

    /// Default wall-clock deadline per run, in seconds
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout: f64,

    /// Maximum submission length in characters
    #[serde(default = "default_max_source_length")]
    pub max_source_length: usize,

    /// Maximum submission line count
    #[serde(default = "default_max_source_lines")]
    pub max_source_lines: usize,

    /// Captured stdout/stderr ceiling in characters
    #[serde(default = "default_max_output_length")]
    pub max_output_length: usize,

    /// Resource caps applied to every run
    #[serde(default)]
    pub default_limits: SandboxLimits,

    /// Per-endpoint admission budgets; endpoints not listed fall back to
    /// [`RateLimitConfig::default`]
    #[serde(default)]
    pub rate_limits: HashMap<String, RateLimitConfig>,
}

impl Config {
    /// Create a config with the embedded defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory execution units are created under
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Admission budget for an endpoint
    pub fn rate_limit_for(&self, endpoint: &str) -> RateLimitConfig {
        self.rate_limits.get(endpoint).cloned().unwrap_or_default()
    }

    /// Size ceilings for the validator
    pub fn source_policy(&self) -> SourcePolicy {
        SourcePolicy {
            max_length: self.max_source_length,
            max_lines: self.max_source_lines,
        }
    }

    /// Wall-clock deadline for a run.
    ///
    /// A positive request override wins; anything else falls back to the
    /// configured default.
    pub fn effective_timeout(&self, override_seconds: Option<f64>) -> Duration {
        let seconds = match override_seconds {
            Some(seconds) if seconds > 0.0 => seconds,
            _ => self.execution_timeout,
        };
        Duration::from_secs_f64(seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_python_binary() -> PathBuf {
    PathBuf::from("python3")
}

fn default_execution_enabled() -> bool {
    true
}

fn default_execution_timeout() -> f64 {
    10.0
}

fn default_max_source_length() -> usize {
    10_000
}

fn default_max_source_lines() -> usize {
    500
}

fn default_max_output_length() -> usize {
    50_000
}
