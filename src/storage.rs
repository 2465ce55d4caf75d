//! Data directory layout. Two independent slots live here: the task
//! collection and the chosen theme, plus the log file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const TASKS_FILE: &str = "tasks.json";
pub const THEME_FILE: &str = "theme.json";
pub const LOG_FILE: &str = "taskdeck.log";

pub fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".taskdeck"))
}

/// Resolve the data directory (explicit override or the default under
/// `$HOME`) and make sure it exists.
pub fn ensure_data_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn tasks_path(dir: &Path) -> PathBuf {
    dir.join(TASKS_FILE)
}

pub fn theme_path(dir: &Path) -> PathBuf {
    dir.join(THEME_FILE)
}

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE)
}
