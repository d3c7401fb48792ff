//! Sync driver.
//!
//! Runs the engine over a list of collections:
//!
//! 1. Retrieve the collection, then page through it.
//! 2. Filter each page against the offset map as it arrives.
//! 3. For each changed record: extract, export body, render, write.
//! 4. Record the offset only after the document is written.
//! 5. After every collection: commit the document store, then persist the
//!    offset map, once.
//!
//! A failing record is reported and skipped; its offset is left alone so the
//! next run retries it. A failing collection is reported and abandoned; the
//! offsets already collected in this run are still persisted.

use tracing::{debug, error, info, warn};

use crate::model::RawRecord;
use crate::sync::detect::detect_changes;
use crate::sync::extract::{PropertyNames, extract};
use crate::sync::offset::OffsetStore;
use crate::sync::render::render;
use crate::sync::source::{BodyExporter, RecordSource};
use crate::sync::store::DocumentStore;
use crate::sync::types::{
    CollectionReport, OffsetMap, RecordFailure, RunOutcome, RunReport, SyncError, SyncResult,
};

/// Knobs for a run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Designated property names.
    pub property_names: PropertyNames,
    /// Detect and extract only: no exports, writes, or persistence.
    pub dry_run: bool,
}

/// Orchestrates one sync run.
pub struct SyncDriver<'a> {
    source: &'a dyn RecordSource,
    exporter: &'a dyn BodyExporter,
    documents: &'a mut dyn DocumentStore,
    offset_store: &'a mut dyn OffsetStore,
    options: SyncOptions,
}

impl<'a> SyncDriver<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn RecordSource,
        exporter: &'a dyn BodyExporter,
        documents: &'a mut dyn DocumentStore,
        offset_store: &'a mut dyn OffsetStore,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            exporter,
            documents,
            offset_store,
            options,
        }
    }

    /// Sync `collection_ids` in order, starting from `offsets`.
    ///
    /// # Errors
    ///
    /// Only bookkeeping failures at the end of the run are returned
    /// (committing the document store or persisting offsets). Record and
    /// collection failures are in the returned report.
    pub fn run(&mut self, collection_ids: &[String], offsets: OffsetMap) -> SyncResult<RunOutcome> {
        let mut offsets = offsets;
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            collections: Vec::with_capacity(collection_ids.len()),
        };

        for collection_id in collection_ids {
            let collection = self.sync_collection(collection_id, &mut offsets);
            report.collections.push(collection);
        }

        if self.options.dry_run {
            info!("Dry run, offsets not persisted");
        } else {
            self.documents.commit()?;
            self.offset_store.persist(&offsets)?;
        }

        info!(
            collections = report.collections.len(),
            scanned = report.total_scanned(),
            written = report.total_written(),
            failed = report.total_failed(),
            "Sync finished"
        );

        Ok(RunOutcome { offsets, report })
    }

    fn sync_collection(&mut self, collection_id: &str, offsets: &mut OffsetMap) -> CollectionReport {
        let mut report = CollectionReport::new(collection_id);

        if let Err(e) = self.page_collection(collection_id, offsets, &mut report) {
            error!(collection = collection_id, error = %e, "Collection sync aborted");
            report.source_error = Some(e.to_string());
        }

        report
    }

    fn page_collection(
        &mut self,
        collection_id: &str,
        offsets: &mut OffsetMap,
        report: &mut CollectionReport,
    ) -> SyncResult<()> {
        let collection = self.source.retrieve_collection(collection_id)?;
        info!(
            collection = collection_id,
            title = collection.title.as_deref().unwrap_or(""),
            "Fetching pages"
        );
        report.title = collection.title;

        let mut cursor: Option<String> = None;
        loop {
            let page = self.source.list_records(collection_id, cursor.as_deref())?;
            let next = page.continuation().map(str::to_string);

            report.scanned += page.records.len();
            let changes = detect_changes(page.records, offsets);
            report.unchanged += changes.unchanged;
            debug!(
                collection = collection_id,
                changed = changes.changed.len(),
                unchanged = changes.unchanged,
                "Page filtered"
            );

            for record in changes.changed {
                match self.process_record(&record) {
                    Ok(edited) => {
                        report.written += 1;
                        if !self.options.dry_run {
                            offsets.insert(record.id.clone(), edited);
                        }
                    }
                    Err(e) => {
                        warn!(record = %record.id, code = e.code(), error = %e, "Record skipped");
                        report.failures.push(RecordFailure::new(&record.id, &e));
                    }
                }
            }

            match next {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    return Err(SyncError::SourceUnavailable {
                        collection_id: collection_id.to_string(),
                        message: format!("pagination cursor {next} did not advance"),
                    });
                }
                Some(next) => cursor = Some(next),
                None => return Ok(()),
            }
        }
    }

    /// Process one changed record. Returns the timestamp to record.
    fn process_record(&mut self, record: &RawRecord) -> SyncResult<String> {
        let edited = record
            .last_edited_time
            .clone()
            .ok_or_else(|| SyncError::malformed(&record.id, "missing last_edited_time"))?;

        info!(record = %record.id, "Processing record");
        let metadata = extract(record, &self.options.property_names)?;
        let title = metadata.title.clone().unwrap_or_default();

        if self.options.dry_run {
            info!(record = %record.id, title = %title, "Would write document");
            return Ok(edited);
        }

        let body = self.exporter.export_body(&record.id)?;
        let content = render(&metadata, &body);
        self.documents.write(&record.id, &title, &content)?;

        Ok(edited)
    }
}
