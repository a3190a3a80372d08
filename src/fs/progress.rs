//! Per-folder record of already harvested item ids.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::naming::sanitize_path_component;
use crate::fs::paths::ensure_dir;

/// Ids previously harvested for one folder, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderProgress {
    pub ids: Vec<String>,
}

impl FolderProgress {
    /// Set view used to detect where the previous harvest ended.
    pub fn seen_ids(&self) -> HashSet<String> {
        self.ids.iter().cloned().collect()
    }
}

/// Stores progress as `<root>/<folder>.txt`, one id per line.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    root: PathBuf,
}

impl ProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, folder: &str) -> Result<PathBuf> {
        let folder = sanitize_path_component(folder)?;
        Ok(self.root.join(format!("{}.txt", folder)))
    }

    /// Load progress for `folder`. A missing file is an empty history.
    pub fn load(&self, folder: &str) -> Result<FolderProgress> {
        let path = self.path_for(folder)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FolderProgress::default())
            }
            Err(e) => return Err(e.into()),
        };

        let ids = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(FolderProgress { ids })
    }

    pub fn save(&self, folder: &str, progress: &FolderProgress) -> Result<()> {
        ensure_dir(&self.root)?;
        std::fs::write(self.path_for(folder)?, progress.ids.join("\n"))?;
        Ok(())
    }

    /// Prepend newly harvested ids to the stored history, dropping repeats.
    pub fn merge_and_save(&self, folder: &str, new_ids: &[String]) -> Result<FolderProgress> {
        let old = self.load(folder)?;
        let merged = merge_ids(new_ids, &old.ids);
        let progress = FolderProgress { ids: merged };
        self.save(folder, &progress)?;
        Ok(progress)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Concatenate `newer` then `older`, keeping the first occurrence of each id.
fn merge_ids(newer: &[String], older: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    newer
        .iter()
        .chain(older)
        .filter(|id| !id.is_empty() && seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path());
        assert!(store.load("someone").unwrap().ids.is_empty());
    }

    #[test]
    fn test_load_ignores_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("someone.txt"), "3\n\n  2 \n1\n").unwrap();

        let store = ProgressStore::new(dir.path());
        assert_eq!(store.load("someone").unwrap().ids, ids(&["3", "2", "1"]));
    }

    #[test]
    fn test_merge_puts_new_first_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path());
        store
            .save("someone", &FolderProgress { ids: ids(&["3", "2", "1"]) })
            .unwrap();

        let merged = store.merge_and_save("someone", &ids(&["5", "4", "3"])).unwrap();

        assert_eq!(merged.ids, ids(&["5", "4", "3", "2", "1"]));
        assert_eq!(store.load("someone").unwrap(), merged);
        assert!(merged.seen_ids().contains("4"));
    }

    #[test]
    fn test_rejects_traversal_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path());
        assert!(store.load("../outside").is_err());
    }
}
