//! Montage CLI - Merge batches of images into a single composited canvas.
//!
//! Montage decodes an ordered batch of images, enhances, rotates and frames
//! each one, lays them out vertically, horizontally or in a two-column grid,
//! and stores the encoded result under a fresh key.
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP service
//! montage serve --bind 0.0.0.0:8080
//!
//! # Merge local files
//! montage merge a.jpg b.png --output merged.png
//!
//! # View configuration
//! montage config show
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use montage_core::Config;

mod cli;
mod logging;
mod server;

/// Montage - Merge batches of images into a single composited canvas.
#[derive(Parser, Debug)]
#[command(name = "montage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "MONTAGE_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the merge endpoint over HTTP
    Serve(cli::serve::ServeArgs),

    /// Merge local image files
    Merge(cli::merge::MergeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
        None => Config::default_path(),
    };

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = load_config(&config_path, cli.config.is_some())?;
    logging::init_from_config(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Montage v{}", montage_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Merge(args) => cli::merge::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, &config_path).await,
    }
}

/// Load the config file at `path`.
///
/// An explicitly requested file must load. The default location may be
/// missing or broken, in which case defaults are used with a warning.
fn load_config(path: &Path, explicit: bool) -> anyhow::Result<Config> {
    if explicit {
        return Ok(Config::load_from(path)?);
    }
    if !path.exists() {
        return Ok(Config::default());
    }
    match Config::load_from(path) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `montage config path`."
            );
            Ok(Config::default())
        }
    }
}
