//! Property extraction: raw property bag -> normalized metadata.
//!
//! Extraction is pure. The only failure is [`SyncError::MalformedRecord`],
//! raised when a designated property has the wrong kind or shape, or when
//! `last_edited_time` cannot be parsed; it affects that record only.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{Cover, NormalizedMetadata, PropertyKind, PropertyValue, RawRecord, RichText};
use crate::sync::types::{SyncError, SyncResult};

/// Names of the designated database properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    /// Title property (kind `title`).
    pub title: String,
    /// Publication date property (kind `date`).
    pub date: String,
    /// Tag property (kind `multi_select`).
    pub tags: String,
    /// Summary property (kind `rich_text`).
    pub summary: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            date: "Post date".to_string(),
            tags: "Tags".to_string(),
            summary: "Summary".to_string(),
        }
    }
}

/// Map a record onto front-matter metadata.
///
/// # Errors
///
/// Returns [`SyncError::MalformedRecord`] if a designated property cannot be
/// interpreted or the timestamp cannot be parsed.
pub fn extract(record: &RawRecord, names: &PropertyNames) -> SyncResult<NormalizedMetadata> {
    let title = match designated(record, &names.title, PropertyKind::Title)? {
        Some(PropertyValue::Title(runs)) => Some(RichText::join_plain(runs)),
        _ => None,
    };

    let date = match designated(record, &names.date, PropertyKind::Date)? {
        Some(PropertyValue::Date(Some(value))) => Some(value.start.clone()),
        _ => None,
    };

    let tags = match designated(record, &names.tags, PropertyKind::MultiSelect)? {
        Some(PropertyValue::MultiSelect(options)) => {
            Some(options.iter().map(|o| o.name.clone()).collect())
        }
        _ => None,
    };

    let summary = match designated(record, &names.summary, PropertyKind::RichText)? {
        Some(PropertyValue::RichText(runs)) => Some(RichText::join_plain(runs)),
        _ => None,
    };

    let lastmod = record
        .last_edited_time
        .as_deref()
        .map(|ts| lastmod(&record.id, ts))
        .transpose()?;

    // Only external covers have a stable URL; uploaded files expire.
    let images = match &record.cover {
        Some(Cover::External { url }) => Some(vec![url.clone()]),
        _ => None,
    };

    Ok(NormalizedMetadata {
        title,
        date,
        lastmod,
        tags,
        summary,
        images,
        draft: false,
    })
}

/// Look up a designated property, checking its kind.
fn designated<'a>(
    record: &'a RawRecord,
    name: &str,
    expected: PropertyKind,
) -> SyncResult<Option<&'a PropertyValue>> {
    match record.properties.get(name) {
        None => Ok(None),
        Some(PropertyValue::Invalid { kind, detail }) => Err(SyncError::malformed(
            &record.id,
            format!("property '{name}' ({kind}) is malformed: {detail}"),
        )),
        Some(value) if value.kind() == Some(expected) => Ok(Some(value)),
        Some(value) => Err(SyncError::malformed(
            &record.id,
            format!(
                "property '{name}' is {}, expected {expected}",
                value.kind_name()
            ),
        )),
    }
}

/// `2024-06-17T03:44:00.000Z` -> `2024-06-17`.
fn lastmod(record_id: &str, timestamp: &str) -> SyncResult<String> {
    let local = timestamp.strip_suffix('Z').unwrap_or(timestamp);

    let date = NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| DateTime::parse_from_rfc3339(timestamp).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDate::parse_from_str(local, "%Y-%m-%d"))
        .map_err(|e| {
            SyncError::malformed(
                record_id,
                format!("unparseable last_edited_time {timestamp:?}: {e}"),
            )
        })?;

    Ok(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    fn full_record() -> RawRecord {
        record(json!({
            "id": "r1",
            "last_edited_time": "2024-06-17T03:44:00.000Z",
            "cover": {"type": "external", "external": {"url": "https://img/cover.png"}},
            "properties": {
                "Name": {"type": "title", "title": [{"plain_text": "Hello"}, {"plain_text": "World"}]},
                "Post date": {"type": "date", "date": {"start": "2024-06-01", "end": null}},
                "Tags": {"type": "multi_select", "multi_select": [{"name": "go"}, {"name": "rust"}]},
                "Summary": {"type": "rich_text", "rich_text": [{"plain_text": "A"}, {"plain_text": "post"}]},
                "Views": {"type": "number", "number": 3}
            }
        }))
    }

    #[test]
    fn test_extract_all_fields() {
        let meta = extract(&full_record(), &PropertyNames::default()).unwrap();
        assert_eq!(
            meta,
            NormalizedMetadata {
                title: Some("Hello World".into()),
                date: Some("2024-06-01".into()),
                lastmod: Some("2024-06-17".into()),
                tags: Some(vec!["go".into(), "rust".into()]),
                summary: Some("A post".into()),
                images: Some(vec!["https://img/cover.png".into()]),
                draft: false,
            }
        );
    }

    #[test]
    fn test_absent_properties_are_absent() {
        let meta = extract(&record(json!({"id": "r1"})), &PropertyNames::default()).unwrap();
        assert_eq!(meta, NormalizedMetadata::default());
    }

    #[test]
    fn test_empty_tag_list_is_some_empty() {
        let rec = record(json!({"id": "r1", "properties": {"Tags": {"multi_select": []}}}));
        let meta = extract(&rec, &PropertyNames::default()).unwrap();
        assert_eq!(meta.tags, Some(vec![]));
    }

    #[test]
    fn test_empty_date_cell_is_absent() {
        let rec = record(json!({"id": "r1", "properties": {"Post date": {"type": "date", "date": null}}}));
        let meta = extract(&rec, &PropertyNames::default()).unwrap();
        assert_eq!(meta.date, None);
    }

    #[test]
    fn test_file_cover_is_not_an_image() {
        let rec = record(json!({
            "id": "r1",
            "cover": {"type": "file", "file": {"url": "https://s3/signed.png"}}
        }));
        let meta = extract(&rec, &PropertyNames::default()).unwrap();
        assert_eq!(meta.images, None);
    }

    #[test]
    fn test_lastmod_formats() {
        assert_eq!(lastmod("r", "2024-06-17T03:44:00.000Z").unwrap(), "2024-06-17");
        assert_eq!(lastmod("r", "2024-06-17T23:59:59Z").unwrap(), "2024-06-17");
        assert_eq!(lastmod("r", "2024-06-17T03:44:00.000+00:00").unwrap(), "2024-06-17");
        assert_eq!(lastmod("r", "2024-06-17").unwrap(), "2024-06-17");
    }

    #[test]
    fn test_unparseable_timestamp_is_malformed() {
        let rec = record(json!({"id": "bad", "last_edited_time": "yesterday"}));
        let err = extract(&rec, &PropertyNames::default()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { ref record_id, .. } if record_id == "bad"));
    }

    #[test]
    fn test_wrong_kind_is_malformed() {
        let rec = record(json!({
            "id": "r1",
            "properties": {"Name": {"type": "rich_text", "rich_text": [{"plain_text": "x"}]}}
        }));
        let err = extract(&rec, &PropertyNames::default()).unwrap_err();
        assert_eq!(err.code(), "MALFORMED_RECORD");
        assert!(err.to_string().contains("expected title"));
    }

    #[test]
    fn test_invalid_shape_is_malformed() {
        let rec = record(json!({"id": "r1", "properties": {"Tags": {"type": "multi_select", "multi_select": 7}}}));
        assert!(extract(&rec, &PropertyNames::default()).is_err());
    }

    #[test]
    fn test_custom_property_names() {
        let rec = record(json!({
            "id": "r1",
            "properties": {"Titre": {"title": [{"plain_text": "Bonjour"}]}}
        }));
        let names = PropertyNames {
            title: "Titre".into(),
            ..PropertyNames::default()
        };
        let meta = extract(&rec, &names).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Bonjour"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let rec = full_record();
        let names = PropertyNames::default();
        assert_eq!(extract(&rec, &names).unwrap(), extract(&rec, &names).unwrap());
    }
}
