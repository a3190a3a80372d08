//! Harvest and download state tracking.

use std::path::PathBuf;

use crate::media::MediaRecord;

/// Outcome counts for one batch of attachment downloads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl DownloadStats {
    pub fn merge(&mut self, other: DownloadStats) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Attachments looked at, whatever happened to them.
    pub fn total(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }
}

/// Per-folder harvest state.
#[derive(Debug, Default)]
pub struct FolderState {
    pub folder: String,
    pub path: Option<PathBuf>,

    /// Records newer than the previous harvest, newest first.
    pub records: Vec<MediaRecord>,

    pub stats: DownloadStats,
}

impl FolderState {
    pub fn new(folder: impl Into<String>, records: Vec<MediaRecord>) -> Self {
        Self {
            folder: folder.into(),
            records,
            ..Default::default()
        }
    }

    /// Ids to prepend to the folder's progress, in harvest order.
    pub fn new_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn attachment_count(&self) -> usize {
        self.records.iter().map(|r| r.attachment_urls.len()).sum()
    }
}

/// Global statistics across all folders.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub records_harvested: u64,
    pub stats: DownloadStats,
    pub folders_processed: u64,
    pub folders_failed: u64,
}

impl GlobalState {
    /// Add statistics from a folder's state.
    pub fn add_folder_stats(&mut self, state: &FolderState) {
        self.records_harvested += state.records.len() as u64;
        self.stats.merge(state.stats);
        self.folders_processed += 1;
    }

    /// Mark a folder as failed.
    pub fn mark_folder_failed(&mut self) {
        self.folders_failed += 1;
    }

    pub fn total_downloaded(&self) -> u64 {
        self.stats.downloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use url::Url;

    fn record(id: &str, urls: usize) -> MediaRecord {
        MediaRecord {
            id: id.to_string(),
            created_at: Utc::now(),
            attachment_urls: (0..urls)
                .map(|i| Url::parse(&format!("https://img.example/{}_{}.jpg", id, i)).unwrap())
                .collect(),
        }
    }

    #[test]
    fn test_folder_state_counts() {
        let state = FolderState::new("someone", vec![record("2", 2), record("1", 1)]);
        assert_eq!(state.new_ids(), vec!["2", "1"]);
        assert_eq!(state.attachment_count(), 3);
    }

    #[test]
    fn test_global_state_accumulates() {
        let mut first = FolderState::new("a", vec![record("1", 1)]);
        first.stats = DownloadStats {
            downloaded: 1,
            skipped: 0,
            failed: 0,
        };
        let mut second = FolderState::new("b", vec![record("2", 2), record("3", 1)]);
        second.stats = DownloadStats {
            downloaded: 1,
            skipped: 1,
            failed: 1,
        };

        let mut global = GlobalState::default();
        global.add_folder_stats(&first);
        global.add_folder_stats(&second);
        global.mark_folder_failed();

        assert_eq!(global.records_harvested, 3);
        assert_eq!(global.total_downloaded(), 2);
        assert_eq!(global.stats.total(), 4);
        assert_eq!(global.folders_processed, 2);
        assert_eq!(global.folders_failed, 1);
    }
}
