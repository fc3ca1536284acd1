//! Tile command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::error;

use crate::batch::output_name;
use crate::config::TilegifConfig;
use crate::error::TileError;
use crate::tiler::Tiler;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Default output path: the batch name template, next to the input.
fn default_output(input: &Path, config: &TilegifConfig) -> PathBuf {
    let name = output_name(&config.batch.name_template, input, config.target());
    input.with_file_name(name)
}

/// Execute the tile command
pub fn run_tile(input: &Path, output: Option<&Path>, config: &TilegifConfig) -> ExitCode {
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(input, config));
    let tiler = Tiler::new(config.tile_options());

    match tiler.tile(input, &output, config.target()) {
        Ok(report) if report.skipped => {
            println!("{} already exists, skipped", output.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(report) => {
            let tiles = report.layout.map(|l| l.tile_count()).unwrap_or(0);
            println!(
                "Created {} ({} frames, {} tiles per frame, {})",
                output.display(),
                report.frame_count,
                tiles,
                report.target
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e @ TileError::InvalidTargetSize { .. }) => {
            error!("{}", e);
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        Err(e) => {
            error!("Failed to tile {}: {}", input.display(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
