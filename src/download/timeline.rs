//! Timeline harvesting: pull records until the previous harvest is reached.

use std::collections::HashSet;

use futures::{Stream, StreamExt};

use crate::browser::Harvester;
use crate::config::Config;
use crate::download::state::FolderState;
use crate::error::Result;
use crate::fs::ProgressStore;
use crate::media::MediaRecord;
use crate::session::SessionCredential;
use crate::stream::MediaStream;

/// Take records until one was already harvested or the stream ends.
pub async fn collect_new_records<S>(records: S, seen: &HashSet<String>) -> Vec<MediaRecord>
where
    S: Stream<Item = MediaRecord>,
{
    futures::pin_mut!(records);

    let mut collected = Vec::new();
    while let Some(record) = records.next().await {
        if seen.contains(&record.id) {
            tracing::info!("Reached previously harvested item {}, stopping", record.id);
            break;
        }
        tracing::debug!(
            "Harvested {} ({} attachments)",
            record.id,
            record.attachment_urls.len()
        );
        collected.push(record);
    }

    collected
}

/// Drain an established stream for new records, then close it.
pub async fn drain_stream(stream: MediaStream, seen: &HashSet<String>) -> Vec<MediaRecord> {
    let records = collect_new_records(stream.clone().into_stream(), seen).await;
    stream.close().await;
    records
}

/// Harvest one folder's media timeline.
///
/// Returns `Ok(None)` when the timeline could not be opened.
pub async fn harvest_timeline(
    harvester: &Harvester,
    config: &Config,
    credential: &SessionCredential,
    progress: &ProgressStore,
    folder: &str,
) -> Result<Option<FolderState>> {
    let seen = progress.load(folder)?.seen_ids();
    let url = config.timeline_url(folder);

    tracing::info!(
        "Harvesting timeline for {} ({} items already known)...",
        folder,
        seen.len()
    );

    let Some(stream) = harvester.open(&url, credential).await? else {
        return Ok(None);
    };

    let records = drain_stream(stream, &seen).await;

    tracing::info!("Timeline harvest complete: {} new items", records.len());

    Ok(Some(FolderState::new(folder, records)))
}
