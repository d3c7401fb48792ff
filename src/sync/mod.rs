//! Incremental sync engine.
//!
//! This module turns database pages into front-matter documents, skipping
//! pages that have not changed since the last run:
//!
//! - **Offsets**: persisted record id -> `last_edited_time` map
//! - **Detection**: per-page filter of new/changed records
//! - **Extraction**: property bag -> normalized metadata
//! - **Rendering**: metadata + body -> document text
//! - **Store**: documents on disk, keyed by title
//! - **Driver**: the run loop tying it together
//!
//! # Crash consistency
//!
//! Documents are written before their offsets are recorded, and offsets are
//! persisted once, atomically, at the end of a run. An interrupted run leaves
//! the offset file exactly as it was; the records it touched are simply
//! processed again next time, which is safe because rendering is
//! deterministic.
//!
//! # Example
//!
//! ```ignore
//! use nsync::sync::{FileDocumentStore, JsonOffsetStore, OffsetStore, SyncDriver, SyncOptions};
//!
//! let mut offsets = JsonOffsetStore::new("notion_offset.json");
//! let mut documents = FileDocumentStore::open("data/blog", "mdx")?;
//! let start = offsets.load()?;
//!
//! let mut driver = SyncDriver::new(&client, &exporter, &mut documents, &mut offsets, SyncOptions::default());
//! let outcome = driver.run(&database_ids, start)?;
//! ```

mod detect;
mod driver;
mod extract;
mod file;
mod offset;
mod render;
mod source;
mod status;
mod store;
mod types;

pub use detect::{ChangeSet, detect_changes, is_changed};
pub use driver::{SyncDriver, SyncOptions};
pub use extract::{PropertyNames, extract};
pub use file::{atomic_write, count_documents, file_size, to_pretty_json};
pub use offset::{DEFAULT_OFFSET_FILE, JsonOffsetStore, MemoryOffsetStore, OffsetStore};
pub use render::{FRONT_MATTER_MARKER, py_str, render};
pub use source::{BodyExporter, CollectionInfo, RecordPage, RecordSource};
pub use status::{get_sync_status, print_status};
pub use store::{
    DocumentStore, FileDocumentStore, MAX_STEM_BYTES, MemoryDocumentStore, OWNERS_FILE,
    document_stem,
};
pub use types::{
    CollectionReport, OffsetMap, RecordFailure, RunOutcome, RunReport, SyncError, SyncResult,
    SyncStatus,
};
