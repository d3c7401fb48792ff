//! Sync engine types.
//!
//! This module defines the offset map, the run report, and the error taxonomy
//! shared by every stage of the engine.

use std::collections::BTreeMap;

use serde::Serialize;

/// Record id -> last synchronized `last_edited_time`.
///
/// A present entry means the record's document was fully written as of that
/// timestamp. Ordered so the persisted file has a stable key order.
pub type OffsetMap = BTreeMap<String, String>;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Offsets after the run (already persisted unless dry-run).
    pub offsets: OffsetMap,
    /// What happened, per collection.
    pub report: RunReport,
}

/// Run-level report.
///
/// Every skipped or failed record and every unreachable collection ends up
/// here, so nothing is dropped even when no one watches the logs.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    /// Whether documents and offsets were left untouched.
    pub dry_run: bool,
    /// One entry per configured collection, in processing order.
    pub collections: Vec<CollectionReport>,
}

impl RunReport {
    /// Records seen across all collections.
    #[must_use]
    pub fn total_scanned(&self) -> usize {
        self.collections.iter().map(|c| c.scanned).sum()
    }

    /// Records skipped because their offset matched.
    #[must_use]
    pub fn total_unchanged(&self) -> usize {
        self.collections.iter().map(|c| c.unchanged).sum()
    }

    /// Documents written (or that would be written, in dry-run).
    #[must_use]
    pub fn total_written(&self) -> usize {
        self.collections.iter().map(|c| c.written).sum()
    }

    /// Records that failed and will be retried next run.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.collections.iter().map(|c| c.failures.len()).sum()
    }

    /// Collections that could not be paged to completion.
    #[must_use]
    pub fn unavailable_collections(&self) -> usize {
        self.collections
            .iter()
            .filter(|c| c.source_error.is_some())
            .count()
    }

    /// True if any record or collection failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.total_failed() > 0 || self.unavailable_collections() > 0
    }
}

/// Per-collection statistics.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CollectionReport {
    /// Collection (database) id.
    pub collection_id: String,
    /// Collection title, if it could be retrieved.
    pub title: Option<String>,
    /// Records returned by the source.
    pub scanned: usize,
    /// Records skipped by change detection.
    pub unchanged: usize,
    /// Documents written.
    pub written: usize,
    /// Records that failed.
    pub failures: Vec<RecordFailure>,
    /// Why paging stopped early, if it did.
    pub source_error: Option<String>,
}

impl CollectionReport {
    #[must_use]
    pub fn new(collection_id: &str) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            ..Self::default()
        }
    }
}

/// A record that was skipped because of an error.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub record_id: String,
    /// Machine-readable code from [`SyncError::code`].
    pub code: &'static str,
    pub message: String,
}

impl RecordFailure {
    #[must_use]
    pub fn new(record_id: &str, err: &SyncError) -> Self {
        Self {
            record_id: record_id.to_string(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Snapshot of the local sync state for `nsync status`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    /// Number of records in the offset store.
    pub tracked_records: usize,
    /// Most recent `last_edited_time` in the offset store.
    pub newest_edit: Option<String>,
    /// Whether the offset file exists.
    pub has_offset_file: bool,
    /// Size of the offset file in bytes.
    pub offset_file_size: u64,
    /// Number of documents in the output directory.
    pub documents: usize,
}

/// Sync-specific errors.
///
/// Severity follows the variant:
/// - `CorruptOffsetStore` is fatal and aborts the run before processing.
/// - `SourceUnavailable` stops one collection.
/// - Everything else stops one record, whose offset stays untouched.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted offset data exists but cannot be parsed.
    #[error("Corrupt offset store at {path}: {message}")]
    CorruptOffsetStore { path: String, message: String },

    /// A record's properties or timestamp cannot be normalized.
    #[error("Malformed record {record_id}: {message}")]
    MalformedRecord { record_id: String, message: String },

    /// Retrieving or paging a collection failed.
    #[error("Collection {collection_id} unavailable: {message}")]
    SourceUnavailable {
        collection_id: String,
        message: String,
    },

    /// The body exporter failed for a record.
    #[error("Body export failed for {record_id}: {message}")]
    BodyExport { record_id: String, message: String },

    /// The record's title cannot be used as a document name.
    #[error("Record {record_id} has no usable title: {title:?}")]
    InvalidTitle { record_id: String, title: String },

    /// Another record already owns the document name.
    #[error("Record {record_id} maps to {file_name}, which belongs to record {owner}")]
    TitleConflict {
        record_id: String,
        file_name: String,
        owner: String,
    },

    /// The document store rejected a write.
    #[error("Writing document for {record_id} failed: {message}")]
    RenderOrWriteFailure { record_id: String, message: String },
}

impl SyncError {
    /// Machine-readable SCREAMING_SNAKE code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::CorruptOffsetStore { .. } => "CORRUPT_OFFSET_STORE",
            Self::MalformedRecord { .. } => "MALFORMED_RECORD",
            Self::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            Self::BodyExport { .. } => "BODY_EXPORT_FAILED",
            Self::InvalidTitle { .. } => "INVALID_TITLE",
            Self::TitleConflict { .. } => "TITLE_CONFLICT",
            Self::RenderOrWriteFailure { .. } => "RENDER_OR_WRITE_FAILURE",
        }
    }

    pub(crate) fn malformed(record_id: &str, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_id: record_id.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
