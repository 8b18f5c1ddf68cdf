//! Classbox CLI
//!
//! Runs a submission through the full execution pipeline from the command
//! line and prints the structured JSON response a frontend would receive.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use classbox::{Config, EXAMPLE_CONFIG, ExecutionRequest, ExecutionService};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "classbox")]
#[command(about = "Sandboxed execution of student Python submissions")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: classbox.toml)
        #[arg(short, long, default_value = "classbox.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run a submission and print the JSON response
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Simulated input line (repeat for multiple prompts, in order)
        #[arg(short, long = "input", value_name = "LINE")]
        inputs: Vec<String>,

        /// Wall-clock timeout in seconds
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Client identifier for rate limiting
        #[arg(long, default_value = "local")]
        client: String,

        /// Rate-limit bucket
        #[arg(long, default_value = "run")]
        endpoint: String,
    },

    /// Show the default configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using defaults with environment overrides");
        Config::from_env().context("failed to load configuration")?
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Run {
            source,
            inputs,
            timeout,
            client,
            endpoint,
        } => run_submission(config, &source, inputs, timeout, client, endpoint).await,
        Commands::ShowConfig => {
            print!("{EXAMPLE_CONFIG}");
            Ok(())
        }
    }
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(path = %output.display(), "wrote example configuration");
    Ok(())
}

async fn run_submission(
    config: Config,
    source: &Path,
    inputs: Vec<String>,
    timeout: Option<f64>,
    client: String,
    endpoint: String,
) -> Result<()> {
    let source_text = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("failed to read {}", source.display()))?;

    let mut request = ExecutionRequest::new(source_text, client)
        .with_inputs(inputs)
        .with_endpoint(endpoint);
    if let Some(seconds) = timeout {
        request = request.with_timeout(seconds);
    }

    let service = ExecutionService::new(config);
    let response = service.handle(request).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
