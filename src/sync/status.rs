//! Sync status display.
//!
//! Summarizes local state only: the offset store and the output directory.
//! Nothing here talks to the record source.

use std::path::Path;

use colored::Colorize;

use crate::sync::file::{count_documents, file_size};
use crate::sync::offset::{JsonOffsetStore, OffsetStore};
use crate::sync::types::{SyncResult, SyncStatus};

/// Get the current local sync status.
///
/// # Errors
///
/// Returns an error if the offset store is corrupt or the output directory
/// cannot be read.
pub fn get_sync_status(
    offset_store: &JsonOffsetStore,
    output_dir: &Path,
    extension: &str,
) -> SyncResult<SyncStatus> {
    let offsets = offset_store.load()?;

    // ISO-8601 timestamps in one zone sort lexically.
    let newest_edit = offsets.values().max().cloned();

    Ok(SyncStatus {
        tracked_records: offsets.len(),
        newest_edit,
        has_offset_file: offset_store.path().exists(),
        offset_file_size: file_size(offset_store.path()),
        documents: count_documents(output_dir, extension)?,
    })
}

/// Print sync status to stdout in a human-readable format.
pub fn print_status(status: &SyncStatus) {
    println!("{}", "Sync Status".bold().underline());
    println!();

    println!("{}", "Offsets:".blue().bold());
    if status.has_offset_file {
        println!("  Tracked records: {}", status.tracked_records);
        println!("  File size:       {} bytes", status.offset_file_size);
        if let Some(newest) = &status.newest_edit {
            println!("  Newest edit:     {newest}");
        }
    } else {
        println!("  {}", "No offset file yet (next sync processes everything)".yellow());
    }
    println!();

    println!("{}", "Documents:".blue().bold());
    println!("  In output directory: {}", status.documents);
}
