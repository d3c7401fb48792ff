//! Normalized front-matter metadata.

use serde::Serialize;

/// Metadata extracted from a record, ready to be rendered as a header.
///
/// Every field except `draft` may be absent. Absent and empty values are
/// both omitted from the rendered header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedMetadata {
    pub title: Option<String>,
    pub date: Option<String>,
    /// `YYYY-MM-DD` derived from the record's `last_edited_time`.
    pub lastmod: Option<String>,
    /// Tag names in source order.
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    /// At most one element: the external cover URL.
    pub images: Option<Vec<String>>,
    pub draft: bool,
}
