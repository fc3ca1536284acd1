//! Configuration loading and discovery for `tilegif.toml`

use super::schema::TilegifConfig;
use crate::models::Size;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery.
pub const CONFIG_FILE_NAME: &str = "tilegif.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse tilegif.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub target: Option<Size>,
    pub skip_existing: Option<bool>,
    pub mask_cache: Option<bool>,
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
}

/// Find tilegif.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for tilegif.toml
/// 2. Check XDG_CONFIG_HOME/tilegif/tilegif.toml (or ~/.config/tilegif/tilegif.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find tilegif.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("tilegif").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find tilegif.toml by walking up from `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a tilegif.toml file.
///
/// With an explicit `path` the file must exist. Otherwise the file is
/// discovered with [`find_config`], and defaults are used when none exists.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("effects/tilegif.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<TilegifConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(TilegifConfig::default()),
    }
}

/// Load and validate a specific file.
///
/// A relative `batch.out_dir` is resolved against the file's directory.
pub fn load_config_file(path: &Path) -> Result<TilegifConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: TilegifConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    if let Some(root) = path.parent() {
        config.batch.out_dir = resolve_path(root, &config.batch.out_dir);
    }
    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut TilegifConfig, overrides: &CliOverrides) {
    if let Some(target) = overrides.target {
        config.tile.target = [target.width, target.height];
    }
    if let Some(skip_existing) = overrides.skip_existing {
        config.tile.skip_existing = skip_existing;
    }
    if let Some(mask_cache) = overrides.mask_cache {
        config.tile.mask_cache = mask_cache;
    }
    if let Some(ref out_dir) = overrides.out_dir {
        config.batch.out_dir = out_dir.clone();
    }
    if let Some(jobs) = overrides.jobs {
        config.batch.jobs = Some(jobs);
    }
}

/// Resolve a path relative to the directory holding the config file.
///
/// Absolute paths and an empty `root` leave `path` unchanged.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || root.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
