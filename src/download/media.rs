//! Attachment downloading.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::download::state::DownloadStats;
use crate::error::{Error, Result};
use crate::fs::{attachment_filename, ensure_dir};
use crate::media::MediaRecord;
use crate::output::create_item_bar;

/// Suffix for files still being written.
const PARTIAL_SUFFIX: &str = ".part";

/// One attachment that is not on disk yet.
#[derive(Debug, Clone)]
struct DownloadJob {
    url: Url,
    path: PathBuf,
}

/// Download every attachment of `records` into `target_dir`.
///
/// Attachments whose file already exists are skipped. A failed attachment is
/// logged and counted; it never aborts the rest of the batch.
pub async fn download_records(
    target_dir: &Path,
    records: &[MediaRecord],
    concurrency: usize,
) -> Result<DownloadStats> {
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| Error::Download(format!("Failed to build HTTP client: {}", e)))?;

    ensure_dir(target_dir)?;

    let mut stats = DownloadStats::default();
    let jobs = plan_jobs(target_dir, records, &mut stats);

    if jobs.is_empty() {
        return Ok(stats);
    }

    let bar = create_item_bar(jobs.len() as u64, "Downloading");

    let mut results = futures::stream::iter(jobs)
        .map(|job| {
            let client = client.clone();
            async move {
                let outcome = download_direct(&client, &job.url, &job.path).await;
                (job, outcome)
            }
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((job, outcome)) = results.next().await {
        bar.inc(1);
        match outcome {
            Ok(()) => {
                tracing::debug!("Downloaded: {}", job.path.display());
                stats.downloaded += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", job.url, e);
                stats.failed += 1;
            }
        }
    }

    bar.finish_and_clear();
    Ok(stats)
}

/// Resolve target paths, counting existing files as skipped and unnamable
/// attachments as failed.
fn plan_jobs(target_dir: &Path, records: &[MediaRecord], stats: &mut DownloadStats) -> Vec<DownloadJob> {
    let mut jobs = Vec::new();

    for record in records.iter().filter(|r| r.has_attachments()) {
        for url in &record.attachment_urls {
            let filename = match attachment_filename(record, url) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Skipping attachment of {}: {}", record.id, e);
                    stats.failed += 1;
                    continue;
                }
            };

            let path = target_dir.join(filename);
            if path.exists() {
                tracing::debug!("Skipping existing file: {}", path.display());
                stats.skipped += 1;
                continue;
            }

            jobs.push(DownloadJob {
                url: url.clone(),
                path,
            });
        }
    }

    jobs
}

/// Stream one file to disk, renaming it into place once complete.
async fn download_direct(client: &reqwest::Client, url: &Url, output_path: &Path) -> Result<()> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;

    let mut partial = output_path.as_os_str().to_owned();
    partial.push(PARTIAL_SUFFIX);
    let partial = PathBuf::from(partial);

    let mut file = File::create(&partial).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&partial, output_path).await?;
    Ok(())
}
