//! Batch command implementation

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

use crate::batch::{discover_inputs, plan_jobs, run_batch as run_jobs, BatchStatus};
use crate::config::TilegifConfig;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the batch command
pub fn run_batch(inputs: &[PathBuf], config: &TilegifConfig) -> ExitCode {
    let options = config.batch_options();

    let files = match discover_inputs(inputs) {
        Ok(files) => files,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    if files.is_empty() {
        error!("No input files found");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let jobs = match plan_jobs(&files, &options) {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let result = match run_jobs(&jobs, &options) {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for item in &result.items {
        match &item.status {
            BatchStatus::Failed { .. } => {
                println!("  {} -> {}", item.job.input.display(), item.status)
            }
            status => println!(
                "  {} -> {} ({})",
                item.job.input.display(),
                item.job.output.display(),
                status
            ),
        }
    }
    println!(
        "{} of {} succeeded in {:.2}s",
        result.success_count(),
        result.items.len(),
        result.total_duration.as_secs_f64()
    );

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
