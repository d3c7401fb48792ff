//! Document store.
//!
//! Documents are keyed by title. The file store turns a title into a file
//! name and keeps an ownership ledger (record id -> file name) so that two
//! records with the same title never silently overwrite each other:
//!
//! - Titles are trimmed; `/ \ : * ? " < > |` and control characters become
//!   `-`; the stem is capped at [`MAX_STEM_BYTES`].
//! - An absent or empty title, or one that reduces to `.`/`..`, fails the
//!   record with [`SyncError::InvalidTitle`].
//! - A file name already owned by another record fails the record with
//!   [`SyncError::TitleConflict`]. Names are compared lowercased, since
//!   case-insensitive filesystems treat `Hello.mdx` and `hello.mdx` as one file.
//! - A claim whose document is gone from disk is stale and is handed over to
//!   the next record that wants the name.
//! - A record whose title changes moves its claim; the old file stays.
//!
//! Files that are not in the ledger (written by hand or by an older tool)
//! are overwritten without a conflict.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::sync::file::{atomic_write, to_pretty_json};
use crate::sync::types::{SyncError, SyncResult};

/// Ownership ledger file name inside the output directory.
pub const OWNERS_FILE: &str = ".notionsync-owners.json";

/// Maximum length of a file stem in bytes.
pub const MAX_STEM_BYTES: usize = 200;

const UNSAFE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Where rendered documents go.
pub trait DocumentStore {
    /// Write (or replace) the document for `record_id` under `title`.
    ///
    /// Returns the name the document was stored under.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidTitle`], [`SyncError::TitleConflict`] or
    /// [`SyncError::RenderOrWriteFailure`]; all of them affect only this record.
    fn write(&mut self, record_id: &str, title: &str, content: &str) -> SyncResult<String>;

    /// Make bookkeeping from this run durable. Called once, before offsets
    /// are persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the bookkeeping cannot be written.
    fn commit(&mut self) -> SyncResult<()>;
}

/// Turn a title into a filesystem-safe file stem.
///
/// Returns `None` if nothing usable is left.
#[must_use]
pub fn document_stem(title: &str) -> Option<String> {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();

    let mut end = cleaned.len().min(MAX_STEM_BYTES);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    let stem = cleaned[..end].trim_end();

    match stem {
        "" | "." | ".." => None,
        stem => Some(stem.to_string()),
    }
}

/// Directory of `<stem>.<extension>` files.
#[derive(Debug)]
pub struct FileDocumentStore {
    dir: PathBuf,
    extension: String,
    /// record id -> file name
    owners: BTreeMap<String, String>,
    dirty: bool,
}

impl FileDocumentStore {
    /// Open a store in `dir`, loading the ownership ledger if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the ledger
    /// cannot be read.
    pub fn open(dir: impl Into<PathBuf>, extension: &str) -> SyncResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let ledger = dir.join(OWNERS_FILE);
        let owners = if ledger.exists() {
            let bytes = fs::read(&ledger)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: {e}", ledger.display()),
                )
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            dir,
            extension: extension.trim_start_matches('.').to_string(),
            owners,
            dirty: false,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name the record currently owns, if any.
    #[must_use]
    pub fn owned_by(&self, record_id: &str) -> Option<&str> {
        self.owners.get(record_id).map(String::as_str)
    }

    fn file_name(&self, record_id: &str, title: &str) -> SyncResult<String> {
        let invalid = || SyncError::InvalidTitle {
            record_id: record_id.to_string(),
            title: title.to_string(),
        };

        let stem = document_stem(title).ok_or_else(invalid)?;
        let file_name = if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        };

        if file_name == OWNERS_FILE {
            return Err(invalid());
        }
        Ok(file_name)
    }

    /// Another record holding `file_name`, compared case-insensitively.
    fn claimant(&self, record_id: &str, file_name: &str) -> Option<(String, String)> {
        let key = file_name.to_lowercase();
        self.owners
            .iter()
            .find(|(id, name)| id.as_str() != record_id && name.to_lowercase() == key)
            .map(|(id, name)| (id.clone(), name.clone()))
    }
}

impl DocumentStore for FileDocumentStore {
    fn write(&mut self, record_id: &str, title: &str, content: &str) -> SyncResult<String> {
        let file_name = self.file_name(record_id, title)?;

        if let Some((owner, owned_name)) = self.claimant(record_id, &file_name) {
            if self.dir.join(&owned_name).exists() {
                return Err(SyncError::TitleConflict {
                    record_id: record_id.to_string(),
                    file_name,
                    owner,
                });
            }
            warn!(
                record = record_id,
                previous_owner = %owner,
                file = %owned_name,
                "Taking over file name whose document no longer exists"
            );
            self.owners.remove(&owner);
            self.dirty = true;
        }

        let path = self.dir.join(&file_name);
        atomic_write(&path, content).map_err(|e| SyncError::RenderOrWriteFailure {
            record_id: record_id.to_string(),
            message: format!("{}: {e}", path.display()),
        })?;

        let previous = self.owners.insert(record_id.to_string(), file_name.clone());
        if previous.as_deref() != Some(file_name.as_str()) {
            self.dirty = true;
            if let Some(previous) = previous {
                info!(
                    record = record_id,
                    previous = %previous,
                    current = %file_name,
                    "Title changed, previous document left in place"
                );
            }
        }

        info!(record = record_id, path = %path.display(), "Document written");
        Ok(file_name)
    }

    fn commit(&mut self) -> SyncResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let ledger = self.dir.join(OWNERS_FILE);
        atomic_write(&ledger, &to_pretty_json(&self.owners)?)?;
        self.dirty = false;
        debug!(path = %ledger.display(), records = self.owners.len(), "Ownership ledger saved");
        Ok(())
    }
}

/// In-memory document store keyed by raw title.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: BTreeMap<String, String>,
    rejected: HashSet<String>,
    writes: usize,
    commits: usize,
}

impl MemoryDocumentStore {
    /// Make every write for `title` fail.
    pub fn reject_title(&mut self, title: &str) {
        self.rejected.insert(title.to_string());
    }

    #[must_use]
    pub fn get(&self, title: &str) -> Option<&str> {
        self.documents.get(title).map(String::as_str)
    }

    #[must_use]
    pub fn documents(&self) -> &BTreeMap<String, String> {
        &self.documents
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }

    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn write(&mut self, record_id: &str, title: &str, content: &str) -> SyncResult<String> {
        if title.trim().is_empty() {
            return Err(SyncError::InvalidTitle {
                record_id: record_id.to_string(),
                title: title.to_string(),
            });
        }
        if self.rejected.contains(title) {
            return Err(SyncError::RenderOrWriteFailure {
                record_id: record_id.to_string(),
                message: "rejected by store".to_string(),
            });
        }
        self.documents.insert(title.to_string(), content.to_string());
        self.writes += 1;
        Ok(title.to_string())
    }

    fn commit(&mut self) -> SyncResult<()> {
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_stem_sanitizes() {
        assert_eq!(document_stem("Hello").as_deref(), Some("Hello"));
        assert_eq!(document_stem("  padded  ").as_deref(), Some("padded"));
        assert_eq!(document_stem("a/b:c*d?").as_deref(), Some("a-b-c-d-"));
        assert_eq!(document_stem("tab\there").as_deref(), Some("tab-here"));
        assert_eq!(document_stem("中文 标题").as_deref(), Some("中文 标题"));
    }

    #[test]
    fn test_document_stem_rejects_unusable() {
        assert_eq!(document_stem(""), None);
        assert_eq!(document_stem("   "), None);
        assert_eq!(document_stem("."), None);
        assert_eq!(document_stem(".."), None);
    }

    #[test]
    fn test_document_stem_truncates_on_char_boundary() {
        let title = "é".repeat(150); // 300 bytes
        let stem = document_stem(&title).unwrap();
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert_eq!(stem.len(), MAX_STEM_BYTES);
        assert!(stem.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_write_and_overwrite_same_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();

        let name = store.write("r1", "Hello", "v1").unwrap();
        assert_eq!(name, "Hello.mdx");
        store.write("r1", "Hello", "v2").unwrap();

        let content = fs::read_to_string(temp_dir.path().join("Hello.mdx")).unwrap();
        assert_eq!(content, "v2");
    }

    #[test]
    fn test_conflicting_title_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();

        store.write("r1", "Hello", "first").unwrap();
        let err = store.write("r2", "Hello", "second").unwrap_err();

        assert!(matches!(err, SyncError::TitleConflict { ref owner, .. } if owner == "r1"));
        let content = fs::read_to_string(temp_dir.path().join("Hello.mdx")).unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn test_sanitized_collision_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "md").unwrap();

        store.write("r1", "a/b", "first").unwrap();
        assert!(matches!(
            store.write("r2", "a:b", "second"),
            Err(SyncError::TitleConflict { .. })
        ));
    }

    #[test]
    fn test_conflict_survives_reopen_after_commit() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
            store.write("r1", "Hello", "first").unwrap();
            store.commit().unwrap();
        }

        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
        assert_eq!(store.owned_by("r1"), Some("Hello.mdx"));
        assert!(matches!(
            store.write("r2", "Hello", "second"),
            Err(SyncError::TitleConflict { .. })
        ));
    }

    #[test]
    fn test_case_only_difference_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();

        store.write("r1", "Hello", "first").unwrap();
        let err = store.write("r2", "hello", "second").unwrap_err();

        assert!(matches!(
            err,
            SyncError::TitleConflict { ref owner, ref file_name, .. }
                if owner == "r1" && file_name == "hello.mdx"
        ));
        let content = fs::read_to_string(temp_dir.path().join("Hello.mdx")).unwrap();
        assert_eq!(content, "first");
        assert_eq!(store.owned_by("r2"), None);
    }

    #[test]
    fn test_same_record_may_change_case() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();

        store.write("r1", "Hello", "v1").unwrap();
        assert_eq!(store.write("r1", "HELLO", "v2").unwrap(), "HELLO.mdx");
        assert_eq!(store.owned_by("r1"), Some("HELLO.mdx"));
    }

    #[test]
    fn test_stale_claim_is_taken_over() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
            store.write("r1", "Hello", "from r1").unwrap();
            store.commit().unwrap();
        }
        fs::remove_file(temp_dir.path().join("Hello.mdx")).unwrap();

        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
        assert_eq!(store.write("r9", "Hello", "from r9").unwrap(), "Hello.mdx");
        assert_eq!(store.owned_by("r9"), Some("Hello.mdx"));
        assert_eq!(store.owned_by("r1"), None);
        store.commit().unwrap();

        let content = fs::read_to_string(temp_dir.path().join("Hello.mdx")).unwrap();
        assert_eq!(content, "from r9");

        // The hand-over is durable, and r1 is now the one locked out.
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
        assert_eq!(store.owned_by("r1"), None);
        assert!(matches!(
            store.write("r1", "Hello", "back again"),
            Err(SyncError::TitleConflict { ref owner, .. }) if owner == "r9"
        ));
    }

    #[test]
    fn test_renamed_record_releases_old_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();

        store.write("r1", "Old", "v1").unwrap();
        store.write("r1", "New", "v2").unwrap();
        assert_eq!(store.owned_by("r1"), Some("New.mdx"));
        assert!(temp_dir.path().join("Old.mdx").exists());

        // The old name is free again.
        store.write("r2", "Old", "other").unwrap();
        assert_eq!(store.owned_by("r2"), Some("Old.mdx"));
    }

    #[test]
    fn test_empty_title_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
        assert!(matches!(store.write("r1", " ", "x"), Err(SyncError::InvalidTitle { .. })));
    }

    #[test]
    fn test_ledger_name_is_reserved() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "json").unwrap();
        assert!(matches!(
            store.write("r1", ".notionsync-owners", "x"),
            Err(SyncError::InvalidTitle { .. })
        ));
    }

    #[test]
    fn test_commit_only_writes_when_dirty() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileDocumentStore::open(temp_dir.path(), "mdx").unwrap();
        store.commit().unwrap();
        assert!(!temp_dir.path().join(OWNERS_FILE).exists());

        store.write("r1", "Hello", "x").unwrap();
        store.commit().unwrap();
        assert!(temp_dir.path().join(OWNERS_FILE).exists());
    }

    #[test]
    fn test_memory_store_rejects() {
        let mut store = MemoryDocumentStore::default();
        store.reject_title("Nope");
        assert!(store.write("r1", "Nope", "x").is_err());
        assert!(store.write("r2", "", "x").is_err());
        store.write("r3", "Yes", "x").unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get("Yes"), Some("x"));
    }
}
