//! Statistics reporting.

use console::style;

use crate::download::{FolderState, GlobalState};

/// Print statistics for a single folder.
pub fn print_folder_stats(state: &FolderState) {
    println!();
    println!(
        "{}",
        style(format!("Statistics for {}:", state.folder)).bold()
    );
    println!("  New items:  {}", state.records.len());
    println!("  Downloaded: {}", state.stats.downloaded);
    println!("  Skipped:    {} (already on disk)", state.stats.skipped);
    if state.stats.failed > 0 {
        println!("  Failed:     {}", style(state.stats.failed).red());
    }
}

/// List what a dry run would download.
pub fn print_harvest_listing(state: &FolderState) {
    println!();
    println!(
        "{}",
        style(format!(
            "{}: {} new items, {} attachments",
            state.folder,
            state.records.len(),
            state.attachment_count()
        ))
        .bold()
    );
    for record in &state.records {
        println!("  {} {}", style(&record.id).dim(), record.created_at.to_rfc3339());
        for url in &record.attachment_urls {
            println!("    {}", url);
        }
    }
}

/// Print global statistics across all folders.
pub fn print_global_stats(state: &GlobalState) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Folders processed: {}", state.folders_processed);
    if state.folders_failed > 0 {
        println!(
            "  Folders failed:    {}",
            style(state.folders_failed).red()
        );
    }
    println!("  New items:  {}", state.records_harvested);
    println!("  Downloaded: {}", style(state.total_downloaded()).green());
    println!("  Skipped:    {}", style(state.stats.skipped).yellow());
    println!("  Failed:     {}", state.stats.failed);
    println!("{}", style("═".repeat(50)).dim());
}
