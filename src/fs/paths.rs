//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::fs::naming::sanitize_path_component;

/// Get the download folder for a harvested account.
pub fn get_folder_path(config: &Config, folder: &str) -> Result<PathBuf> {
    let folder = sanitize_path_component(folder)?;
    Ok(config.storage_root().join(folder))
}

/// List account folders under the storage root, sorted by name.
///
/// A missing root yields an empty list.
pub fn list_folders(root: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut folders = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            folders.push(name.to_string());
        }
    }

    folders.sort();
    Ok(folders)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
