//! Batch tiling
//!
//! Tiles many source files into one output directory. Files are independent,
//! so they run in parallel on a rayon pool and share one append-only
//! [`MaskCache`]. A failing file is recorded and does not stop the others.
//!
//! # Example
//!
//! ```ignore
//! use tilegif::batch::{discover_inputs, plan_jobs, run_batch, BatchOptions};
//!
//! let inputs = discover_inputs(&[PathBuf::from("effects")])?;
//! let options = BatchOptions::default();
//! let jobs = plan_jobs(&inputs, &options)?;
//! let result = run_batch(&jobs, &options)?;
//! println!("{} created, {} failed", result.success_count(), result.failure_count());
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glob::{glob_with, MatchOptions};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::mask::MaskCache;
use crate::models::Size;
use crate::tiler::{TileOptions, TileReport, Tiler, DEFAULT_TARGET};

/// Default output file name, relative to the output directory.
pub const DEFAULT_NAME_TEMPLATE: &str = "{stem}_tiled_{width}x{height}.gif";

/// Error setting up a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Invalid glob pattern built from an input directory
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, glob::PatternError),
    /// Two inputs would be written to the same output file
    #[error("Inputs '{}' and '{}' both map to '{}'", .first.display(), .second.display(), .output.display())]
    DuplicateOutput { first: PathBuf, second: PathBuf, output: PathBuf },
    /// Worker pool could not be created
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub out_dir: PathBuf,
    pub target: Size,
    /// Worker count, at least 1
    pub jobs: usize,
    pub name_template: String,
    pub tile: TileOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("generated_effects"),
            target: DEFAULT_TARGET,
            jobs: default_jobs(),
            name_template: DEFAULT_NAME_TEMPLATE.to_string(),
            tile: TileOptions::default(),
        }
    }
}

/// Default number of parallel jobs (uses available parallelism).
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// One input/output pair of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Status of one batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// Output written
    Created,
    /// Output already existed
    Skipped,
    /// Tiling failed; `recoverable` mirrors [`crate::TileError::is_recoverable`]
    Failed { error: String, recoverable: bool },
}

impl BatchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchStatus::Created | BatchStatus::Skipped)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Created => write!(f, "created"),
            BatchStatus::Skipped => write!(f, "skipped"),
            BatchStatus::Failed { error, .. } => write!(f, "failed: {}", error),
        }
    }
}

/// Result of one batch job.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub job: BatchJob,
    pub status: BatchStatus,
    pub report: Option<TileReport>,
    pub duration: Duration,
}

/// Result of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Items in job order
    pub items: Vec<BatchItem>,
    pub total_duration: Duration,
    pub cached_masks: usize,
}

impl BatchResult {
    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.items.len() - self.success_count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Expand directories to the `*.gif` files they contain (any extension case);
/// files pass through.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let pattern = format!("{}/*.gif", glob::Pattern::escape(&path.display().to_string()));
        let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };
        let entries = glob_with(&pattern, options)
            .map_err(|e| BatchError::InvalidPattern(pattern.clone(), e))?;
        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(p) if p.is_file() => Some(p),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path");
                    None
                }
            })
            .collect();
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

/// Render the output name template for `input`.
///
/// Supports `{stem}`, `{width}` and `{height}`.
pub fn output_name(template: &str, input: &Path, target: Size) -> String {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    template
        .replace("{stem}", stem)
        .replace("{width}", &target.width.to_string())
        .replace("{height}", &target.height.to_string())
}

/// Pair every input with its output path, rejecting collisions.
pub fn plan_jobs(inputs: &[PathBuf], options: &BatchOptions) -> Result<Vec<BatchJob>, BatchError> {
    let mut seen: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut jobs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let output =
            options.out_dir.join(output_name(&options.name_template, input, options.target));
        if let Some(first) = seen.insert(output.clone(), input.clone()) {
            return Err(BatchError::DuplicateOutput { first, second: input.clone(), output });
        }
        jobs.push(BatchJob { input: input.clone(), output });
    }
    Ok(jobs)
}

/// Run `jobs` with a fresh mask cache.
pub fn run_batch(jobs: &[BatchJob], options: &BatchOptions) -> Result<BatchResult, BatchError> {
    run_batch_with_cache(jobs, options, Arc::new(MaskCache::new()))
}

/// Run `jobs` in parallel, sharing `cache` between workers.
pub fn run_batch_with_cache(
    jobs: &[BatchJob],
    options: &BatchOptions,
    cache: Arc<MaskCache>,
) -> Result<BatchResult, BatchError> {
    let start = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(options.jobs.max(1)).build()?;
    let tiler = Tiler::new(options.tile.clone()).with_cache(Arc::clone(&cache));

    info!(jobs = jobs.len(), workers = options.jobs.max(1), "Starting batch");
    let items: Vec<BatchItem> =
        pool.install(|| jobs.par_iter().map(|job| run_job(&tiler, job, options.target)).collect());

    let result = BatchResult { items, total_duration: start.elapsed(), cached_masks: cache.len() };
    info!(
        created = result.success_count(),
        failed = result.failure_count(),
        elapsed_ms = result.total_duration.as_millis() as u64,
        "Batch finished"
    );
    Ok(result)
}

fn run_job(tiler: &Tiler, job: &BatchJob, target: Size) -> BatchItem {
    let start = Instant::now();
    let (status, report) = match tiler.tile(&job.input, &job.output, target) {
        Ok(report) if report.skipped => (BatchStatus::Skipped, Some(report)),
        Ok(report) => (BatchStatus::Created, Some(report)),
        Err(e) => {
            warn!(input = %job.input.display(), error = %e, "Tiling failed");
            (BatchStatus::Failed { error: e.to_string(), recoverable: e.is_recoverable() }, None)
        }
    };
    BatchItem { job: job.clone(), status, report, duration: start.elapsed() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_gif, GifFixtureFrame};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_output_name_template() {
        let name =
            output_name(DEFAULT_NAME_TEMPLATE, Path::new("effects/star.gif"), Size::new(1080, 1080));
        assert_eq!(name, "star_tiled_1080x1080.gif");
        assert_eq!(output_name("{stem}.gif", Path::new("a/b.c.gif"), Size::new(1, 2)), "b.c.gif");
    }

    #[test]
    fn test_discover_inputs_expands_directories() {
        let dir = tempdir().unwrap();
        write_gif(&dir.path().join("b.gif"), 2, 2, &[GifFixtureFrame::solid(2, 2, 1)]);
        write_gif(&dir.path().join("a.gif"), 2, 2, &[GifFixtureFrame::solid(2, 2, 1)]);
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let explicit = dir.path().join("explicit.png");

        let found = discover_inputs(&[dir.path().to_path_buf(), explicit.clone()]).unwrap();
        assert_eq!(found, vec![dir.path().join("a.gif"), dir.path().join("b.gif"), explicit]);
    }

    #[test]
    fn test_discover_inputs_ignores_extension_case() {
        let dir = tempdir().unwrap();
        write_gif(&dir.path().join("LOUD.GIF"), 2, 2, &[GifFixtureFrame::solid(2, 2, 1)]);
        write_gif(&dir.path().join("mixed.Gif"), 2, 2, &[GifFixtureFrame::solid(2, 2, 1)]);
        write_gif(&dir.path().join("quiet.gif"), 2, 2, &[GifFixtureFrame::solid(2, 2, 1)]);

        let found = discover_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("LOUD.GIF"),
                dir.path().join("mixed.Gif"),
                dir.path().join("quiet.gif")
            ]
        );
    }

    #[test]
    fn test_plan_rejects_duplicate_outputs() {
        let options = BatchOptions::default();
        let inputs = vec![PathBuf::from("one/star.gif"), PathBuf::from("two/star.gif")];
        let err = plan_jobs(&inputs, &options).unwrap_err();
        assert!(matches!(err, BatchError::DuplicateOutput { .. }));
    }

    #[test]
    fn test_run_batch_mixed_results() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let frame =
            GifFixtureFrame::from_indices(2, 2, vec![0, 1, 2, 0]).transparent(0).delay_cs(6);
        write_gif(&src.join("one.gif"), 2, 2, &[frame.clone(), frame.clone()]);
        write_gif(&src.join("two.gif"), 2, 2, &[frame.clone()]);

        let options = BatchOptions {
            out_dir: dir.path().join("out"),
            target: Size::new(5, 3),
            jobs: 2,
            ..BatchOptions::default()
        };
        let mut inputs = discover_inputs(&[src.clone()]).unwrap();
        inputs.push(src.join("missing.gif"));
        let jobs = plan_jobs(&inputs, &options).unwrap();
        let result = run_batch(&jobs, &options).unwrap();

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.cached_masks, 1);
        assert!(dir.path().join("out/one_tiled_5x3.gif").exists());
        assert!(dir.path().join("out/two_tiled_5x3.gif").exists());
        assert!(matches!(
            result.items[2].status,
            BatchStatus::Failed { recoverable: true, .. }
        ));
        assert_eq!(result.items[0].report.as_ref().unwrap().frame_count, 2);
    }

    #[test]
    fn test_batch_status_display() {
        assert_eq!(BatchStatus::Created.to_string(), "created");
        let failed = BatchStatus::Failed { error: "boom".into(), recoverable: false };
        assert_eq!(failed.to_string(), "failed: boom");
        assert!(!failed.is_success());
    }
}
