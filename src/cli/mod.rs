//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod batch;
mod info;
mod tile;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, TilegifConfig};
use crate::models::Size;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// tilegif - Tile animated GIFs onto a fixed-size canvas
#[derive(Parser)]
#[command(name = "tilegif")]
#[command(about = "Tile animated GIF/PNG sources onto a fixed canvas with parity mirroring")]
#[command(version)]
pub struct Cli {
    /// Config file (default: discover tilegif.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tile one animation
    Tile {
        /// Source animation (.gif or .png)
        input: PathBuf,

        /// Output file.
        /// If omitted: {stem}_tiled_{width}x{height}.gif next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target canvas size (e.g. 1080x1080)
        #[arg(long)]
        size: Option<Size>,

        /// Keep an existing output instead of regenerating it
        #[arg(long)]
        skip_existing: bool,

        /// Disable the transparency mask cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Tile many animations into one directory
    Batch {
        /// Source files or directories (directories expand to their *.gif files)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Target canvas size (e.g. 1080x1080)
        #[arg(long)]
        size: Option<Size>,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Keep existing outputs instead of regenerating them
        #[arg(long)]
        skip_existing: bool,
    },

    /// Show frame, timing and disposal information of a source
    Info {
        /// Source animation (.gif or .png)
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Install the global log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` selects debug and `-q` errors only.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the config file and apply CLI overrides, validating the result.
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<TilegifConfig, ExitCode> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading config: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };
    merge_cli_overrides(&mut config, overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in errors {
            error!("Invalid argument: {}", e);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    debug!(?config, "Resolved configuration");
    Ok(config)
}

/// Parse arguments and run the selected command
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Tile { input, output, size, skip_existing, no_cache } => {
            let overrides = CliOverrides {
                target: size,
                skip_existing: skip_existing.then_some(true),
                mask_cache: no_cache.then_some(false),
                ..Default::default()
            };
            match resolve_config(config_path, &overrides) {
                Ok(config) => tile::run_tile(&input, output.as_deref(), &config),
                Err(code) => code,
            }
        }
        Commands::Batch { inputs, out_dir, size, jobs, skip_existing } => {
            let overrides = CliOverrides {
                target: size,
                skip_existing: skip_existing.then_some(true),
                out_dir,
                jobs,
                ..Default::default()
            };
            match resolve_config(config_path, &overrides) {
                Ok(config) => batch::run_batch(&inputs, &config),
                Err(code) => code,
            }
        }
        Commands::Info { input, json } => info::run_info(&input, json),
    }
}
