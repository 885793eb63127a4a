//! Centralized path resolution for eksplat
//!
//! # Environment Variables
//!
//! - `EKSPLAT_CONFIG_DIR` - Override the directory holding `<stack>.toml` files
//! - `EKSPLAT_WORK_DIR` - Override the directory the rendered program is written to
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `EKSPLAT_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/eksplat` (if set)
//! 3. Platform default (`~/.config/eksplat`, `%APPDATA%\eksplat` on Windows)
//!
//! For work_dir(stack):
//! 1. `EKSPLAT_WORK_DIR` environment variable
//! 2. `XDG_CACHE_HOME/eksplat/<stack>` (if set)
//! 3. Platform default (`~/.cache/eksplat/<stack>`)
//!
//! The work directory only holds regenerated output; nothing in it is read
//! back as state.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "EKSPLAT_CONFIG_DIR";

/// Environment variable for work directory override
pub const ENV_WORK_DIR: &str = "EKSPLAT_WORK_DIR";

/// Get the eksplat config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("eksplat");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("eksplat");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("eksplat");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Default stack file: `<config_dir>/<stack>.toml`
pub fn stack_file(stack: &str) -> Result<PathBuf> {
    Ok(config_dir()?.join(format!("{stack}.toml")))
}

/// Directory the rendered program for a stack is written to
pub fn work_dir(stack: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_WORK_DIR) {
        let path = expand(&dir);
        log::debug!("Using work dir from {}: {}", ENV_WORK_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        let path = PathBuf::from(xdg_cache).join("eksplat").join(stack);
        log::debug!("Using XDG_CACHE_HOME: {}", path.display());
        return Ok(path);
    }

    let cache = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .context("Could not determine cache directory")?;
    let path = cache.join("eksplat").join(stack);
    log::debug!("Using default work dir: {}", path.display());
    Ok(path)
}

/// Stack file to read: `--config` (expanded) if given, else `stack_file`
///
/// The flag is `true` when the path was given explicitly.
pub fn config_file(explicit: Option<&Path>, stack: &str) -> Result<(PathBuf, bool)> {
    match explicit {
        Some(path) => Ok((expand(&path.to_string_lossy()), true)),
        None => Ok((stack_file(stack)?, false)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
