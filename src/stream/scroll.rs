//! Scroll-to-bottom driver with stagnation detection.

use std::time::Duration;

use tokio::time::sleep;

use crate::browser::{CellMarker, PageActions};
use crate::error::Result;

/// Default escalating waits between scroll attempts.
pub const DEFAULT_SCROLL_INTERVALS: [Duration; 3] = [
    Duration::from_millis(10),
    Duration::from_millis(50),
    Duration::from_millis(100),
];

/// How a scroll run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// No content cell was rendered, the page has probably not loaded yet.
    NotLoaded,
    /// The last cell stopped changing through every wait interval.
    Stagnated,
}

/// Summary of one scroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    pub outcome: ScrollOutcome,
    pub scrolls: usize,
    pub dialogs_dismissed: usize,
}

/// Drives a page towards the bottom of its listing to provoke more loading.
///
/// The driver only attempts to trigger loading; whether data actually
/// arrived is decided by the stream coordinator.
#[derive(Debug, Clone)]
pub struct ScrollDriver {
    intervals: Vec<Duration>,
}

impl Default for ScrollDriver {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_INTERVALS.to_vec())
    }
}

impl ScrollDriver {
    /// Create a driver with ascending wait intervals.
    ///
    /// Zero intervals are raised to one millisecond so stagnation detection
    /// never degenerates into a busy loop.
    pub fn new(intervals: Vec<Duration>) -> Self {
        let mut intervals: Vec<Duration> = intervals
            .into_iter()
            .map(|d| d.max(Duration::from_millis(1)))
            .collect();
        if intervals.is_empty() {
            intervals = DEFAULT_SCROLL_INTERVALS.to_vec();
        }
        Self { intervals }
    }

    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }

    /// Scroll until the last rendered cell stops changing.
    pub async fn scroll_to_bottom(&self, page: &dyn PageActions) -> Result<ScrollReport> {
        let mut previous: Option<CellMarker> = None;
        let mut index = 0;
        let mut scrolls = 0;
        let mut dialogs_dismissed = 0;

        loop {
            if page.dismiss_dialog().await? {
                dialogs_dismissed += 1;
                tracing::debug!("Dismissed interstitial dialog");
            }

            let last = match page.last_cell().await? {
                Some(cell) => cell,
                None => {
                    tracing::warn!(
                        "Failed to find last timeline cell, possibly the page hasn't loaded yet"
                    );
                    return Ok(ScrollReport {
                        outcome: ScrollOutcome::NotLoaded,
                        scrolls,
                        dialogs_dismissed,
                    });
                }
            };

            if previous.as_ref() == Some(&last) {
                if index + 1 < self.intervals.len() {
                    index += 1;
                } else {
                    return Ok(ScrollReport {
                        outcome: ScrollOutcome::Stagnated,
                        scrolls,
                        dialogs_dismissed,
                    });
                }
            } else {
                index = 0;
                page.scroll_into_view(&last).await?;
                scrolls += 1;
                previous = Some(last);
            }

            sleep(self.intervals[index]).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// Page whose last cell follows a script; the final entry repeats forever.
    struct ScriptedPage {
        cells: Mutex<VecDeque<Option<&'static str>>>,
        dialogs: Mutex<VecDeque<bool>>,
        scrolled: Mutex<Vec<String>>,
    }

    impl ScriptedPage {
        fn new(cells: &[Option<&'static str>]) -> Self {
            Self {
                cells: Mutex::new(cells.iter().copied().collect()),
                dialogs: Mutex::new(VecDeque::new()),
                scrolled: Mutex::new(Vec::new()),
            }
        }

        fn with_dialogs(self, dialogs: &[bool]) -> Self {
            *self.dialogs.lock() = dialogs.iter().copied().collect();
            self
        }
    }

    #[async_trait]
    impl PageActions for ScriptedPage {
        async fn dismiss_dialog(&self) -> Result<bool> {
            Ok(self.dialogs.lock().pop_front().unwrap_or(false))
        }

        async fn last_cell(&self) -> Result<Option<CellMarker>> {
            let mut cells = self.cells.lock();
            let next = if cells.len() > 1 {
                cells.pop_front().flatten()
            } else {
                cells.front().copied().flatten()
            };
            Ok(next.map(CellMarker::new))
        }

        async fn scroll_into_view(&self, marker: &CellMarker) -> Result<()> {
            self.scrolled.lock().push(marker.as_str().to_string());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_loaded_aborts_immediately() {
        let page = ScriptedPage::new(&[None]);
        let start = Instant::now();

        let report = ScrollDriver::default().scroll_to_bottom(&page).await.unwrap();

        assert_eq!(report.outcome, ScrollOutcome::NotLoaded);
        assert_eq!(report.scrolls, 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stagnation_escalates_then_gives_up() {
        let page = ScriptedPage::new(&[Some("a")]);
        let start = Instant::now();

        let report = ScrollDriver::default().scroll_to_bottom(&page).await.unwrap();

        assert_eq!(report.outcome, ScrollOutcome::Stagnated);
        assert_eq!(report.scrolls, 1);
        // One wait after the scroll, then the medium and long waits.
        assert_eq!(start.elapsed(), Duration::from_millis(10 + 50 + 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_resets_interval() {
        let page = ScriptedPage::new(&[Some("a"), Some("a"), Some("b")]);
        let start = Instant::now();

        let report = ScrollDriver::default().scroll_to_bottom(&page).await.unwrap();

        assert_eq!(report.scrolls, 2);
        assert_eq!(*page.scrolled.lock(), vec!["a", "b"]);
        // a: 10, a again: 50, b resets: 10, then b stagnates through 50 and 100.
        assert_eq!(start.elapsed(), Duration::from_millis(10 + 50 + 10 + 50 + 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dialogs_are_dismissed_each_iteration() {
        let page = ScriptedPage::new(&[Some("a")]).with_dialogs(&[true, false, true]);

        let report = ScrollDriver::default().scroll_to_bottom(&page).await.unwrap();

        assert_eq!(report.dialogs_dismissed, 2);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let driver = ScrollDriver::new(vec![Duration::ZERO, Duration::from_millis(5)]);
        assert_eq!(
            driver.intervals(),
            &[Duration::from_millis(1), Duration::from_millis(5)]
        );
        assert_eq!(ScrollDriver::new(Vec::new()).intervals().len(), 3);
    }
}
