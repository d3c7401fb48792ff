//! Collaborator interfaces: where records and bodies come from.
//!
//! The engine only ever talks to these traits. The Notion client implements
//! both; tests use in-memory fakes.

use serde::Deserialize;

use crate::model::RawRecord;
use crate::sync::types::SyncResult;

/// Metadata about a collection, fetched before paging it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionInfo {
    pub id: String,
    pub title: Option<String>,
}

/// One page of records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordPage {
    #[serde(rename = "results", default)]
    pub records: Vec<RawRecord>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl RecordPage {
    /// Cursor for the following page, or `None` at end of collection.
    ///
    /// `has_more = false` and a missing cursor both mean the end.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref().filter(|c| !c.is_empty())
        } else {
            None
        }
    }
}

/// Paginated provider of raw records.
pub trait RecordSource {
    /// Look up a collection before paging it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SourceUnavailable`](crate::sync::SyncError::SourceUnavailable)
    /// if the collection cannot be reached.
    fn retrieve_collection(&self, collection_id: &str) -> SyncResult<CollectionInfo>;

    /// Fetch one page, starting at `cursor` (`None` for the first page).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SourceUnavailable`](crate::sync::SyncError::SourceUnavailable)
    /// if the page cannot be fetched.
    fn list_records(&self, collection_id: &str, cursor: Option<&str>) -> SyncResult<RecordPage>;
}

/// Produces the document body for a record.
pub trait BodyExporter {
    /// # Errors
    ///
    /// Returns [`SyncError::BodyExport`](crate::sync::SyncError::BodyExport)
    /// if the body cannot be produced.
    fn export_body(&self, record_id: &str) -> SyncResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_query_response() {
        let page: RecordPage = serde_json::from_value(json!({
            "object": "list",
            "results": [{"id": "r1", "last_edited_time": "2024-06-17T03:44:00.000Z"}],
            "has_more": true,
            "next_cursor": "c2"
        }))
        .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.continuation(), Some("c2"));
    }

    #[test]
    fn test_continuation_end_conditions() {
        let last = RecordPage {
            records: vec![],
            has_more: false,
            next_cursor: Some("ignored".into()),
        };
        assert_eq!(last.continuation(), None);

        let no_cursor = RecordPage {
            records: vec![],
            has_more: true,
            next_cursor: None,
        };
        assert_eq!(no_cursor.continuation(), None);
    }
}
