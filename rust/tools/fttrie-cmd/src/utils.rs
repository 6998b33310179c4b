//! Common utilities for fttrie-cmd

use std::path::Path;

use anyhow::Result;

/// Checks that a directory exists.
pub fn validate_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path.display());
    }
    Ok(())
}
