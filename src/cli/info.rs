//! Info command implementation

use std::path::Path;
use std::process::ExitCode;

use tracing::error;

use crate::inspect::{summarize, AnimationSummary, LoopCount};

use super::{EXIT_ERROR, EXIT_SUCCESS};

fn format_loop(loop_count: Option<LoopCount>) -> String {
    match loop_count {
        Some(LoopCount::Infinite) => "forever".to_string(),
        Some(LoopCount::Finite(0)) => "once".to_string(),
        Some(LoopCount::Finite(n)) => format!("{} extra times", n),
        None => "n/a".to_string(),
    }
}

fn print_summary(input: &Path, summary: &AnimationSummary) {
    println!("{}", input.display());
    println!("  Format:   {:?}", summary.format);
    println!("  Size:     {}", summary.size);
    println!("  Frames:   {}", summary.frame_count);
    println!("  Duration: {} ms", summary.total_duration_ms);
    println!("  Loops:    {}", format_loop(summary.loop_count));
    for frame in &summary.frames {
        let transparency = frame
            .transparency_index
            .map(|i| format!(", transparent {}", i))
            .unwrap_or_default();
        println!(
            "  [{:>3}] {}x{} {} ms, disposal {}{}",
            frame.index,
            frame.width,
            frame.height,
            frame.duration_ms,
            frame.disposal_method,
            transparency
        );
    }
}

/// Execute the info command
pub fn run_info(input: &Path, json: bool) -> ExitCode {
    let summary = match summarize(input) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Failed to read {}: {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print_summary(input, &summary);
    }
    ExitCode::from(EXIT_SUCCESS)
}
