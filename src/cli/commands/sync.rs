//! Sync command implementation.
//!
//! Loads offsets, pulls every configured database through the Notion client
//! and writes changed pages as front-matter documents. Offsets are only
//! persisted after the run, and only for records that made it to disk.

use colored::Colorize;
use tracing::{info, warn};

use crate::cli::commands::Workspace;
use crate::config::resolve_token;
use crate::error::{Error, Result};
use crate::notion::NotionClient;
use crate::sync::{
    CollectionReport, DocumentStore, FileDocumentStore, JsonOffsetStore, MemoryDocumentStore,
    OffsetStore, RunReport, SyncDriver, SyncOptions,
};

/// Execute the sync command.
///
/// # Errors
///
/// Returns an error if setup fails (token, config, corrupt offsets), if
/// bookkeeping at the end of the run fails, or [`Error::RunFailures`] if any
/// record or database failed.
pub fn execute(
    ws: &Workspace,
    token: Option<&str>,
    api_base: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let databases = &ws.config.config.databases_id;
    if databases.is_empty() {
        warn!(config = %ws.config.path.display(), "No databases configured");
    }

    let token = resolve_token(token)?;

    let mut offset_store = JsonOffsetStore::new(&ws.offset_file);
    let offsets = offset_store.load()?;
    info!(
        tracked = offsets.len(),
        path = %ws.offset_file.display(),
        "Loaded offsets"
    );

    // A dry run never touches the store, so don't create the output directory.
    let mut file_store;
    let mut preview_store;
    let documents: &mut dyn DocumentStore = if dry_run {
        preview_store = MemoryDocumentStore::default();
        &mut preview_store
    } else {
        file_store = FileDocumentStore::open(&ws.output_dir, ws.extension())?;
        &mut file_store
    };

    let mut client = NotionClient::new(token)?.with_page_size(ws.config.config.page_size);
    if let Some(base) = api_base {
        client = client.with_api_base(base);
    }

    let options = SyncOptions {
        property_names: ws.config.config.properties.clone(),
        dry_run,
    };
    let outcome = SyncDriver::new(&client, &client, documents, &mut offset_store, options)
        .run(databases, offsets)?;
    let report = outcome.report;

    if json {
        let output = serde_json::json!({
            "success": !report.has_failures(),
            "dry_run": report.dry_run,
            "output_dir": ws.output_dir.display().to_string(),
            "offset_file": ws.offset_file.display().to_string(),
            "tracked_records": outcome.offsets.len(),
            "totals": {
                "scanned": report.total_scanned(),
                "unchanged": report.total_unchanged(),
                "written": report.total_written(),
                "failed": report.total_failed(),
                "unavailable_databases": report.unavailable_collections(),
            },
            "databases": report.collections,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_report(&report, ws);
    }

    if report.has_failures() {
        return Err(Error::RunFailures {
            failed: report.total_failed(),
            unavailable: report.unavailable_collections(),
        });
    }
    Ok(())
}

fn print_collection(collection: &CollectionReport, dry_run: bool) {
    let name = collection.title.as_deref().map_or_else(
        || collection.collection_id.clone(),
        |title| format!("{title} ({})", collection.collection_id),
    );

    if let Some(error) = &collection.source_error {
        println!("  {} {name}: {}", "✗".red(), error.red());
        return;
    }

    let verb = if dry_run { "to write" } else { "written" };
    let marker = if collection.failures.is_empty() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "  {marker} {name}: {} scanned, {} unchanged, {} {verb}",
        collection.scanned, collection.unchanged, collection.written
    );
    for failure in &collection.failures {
        println!(
            "      {} {} [{}] {}",
            "✗".red(),
            failure.record_id,
            failure.code,
            failure.message
        );
    }
}

fn print_report(report: &RunReport, ws: &Workspace) {
    let heading = if report.dry_run {
        "Sync preview (dry run)"
    } else {
        "Sync complete"
    };
    println!("{}", heading.bold());
    println!();

    if report.collections.is_empty() {
        println!("  No databases configured in {}", ws.config.path.display());
        return;
    }

    for collection in &report.collections {
        print_collection(collection, report.dry_run);
    }

    println!();
    let written = if report.dry_run {
        format!("{} to write", report.total_written())
    } else {
        format!("{} written", report.total_written())
    };
    println!(
        "  Total: {} scanned, {} unchanged, {written}, {} failed",
        report.total_scanned(),
        report.total_unchanged(),
        report.total_failed()
    );
    if !report.dry_run {
        println!("  Location: {}", ws.output_dir.display());
    }
}
