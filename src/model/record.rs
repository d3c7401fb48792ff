//! Raw record model.
//!
//! A [`RawRecord`] is one database page as returned by the record source.
//! Its property bag is decoded into a typed union ([`PropertyValue`]) so the
//! extractor can pattern match instead of chasing optional keys through
//! untyped JSON.
//!
//! Decoding is lenient per property: a property whose payload has the wrong
//! shape becomes [`PropertyValue::Invalid`] rather than failing the whole
//! page. Only the designated properties are ever inspected, so junk in an
//! unrelated column never blocks a record.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A database page as returned by the record source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRecord {
    /// Stable unique identifier of the page.
    pub id: String,

    /// ISO-8601 modification timestamp, e.g. `2024-06-17T03:44:00.000Z`.
    #[serde(default)]
    pub last_edited_time: Option<String>,

    /// Property name -> typed property value.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,

    /// Page cover image, if any.
    #[serde(default)]
    pub cover: Option<Cover>,
}

/// The property kinds the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    MultiSelect,
    Date,
}

impl PropertyKind {
    const ALL: [Self; 4] = [Self::Title, Self::RichText, Self::MultiSelect, Self::Date];

    /// Wire name of the kind (also the payload key).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::MultiSelect => "multi_select",
            Self::Date => "date",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    MultiSelect(Vec<SelectOption>),
    /// `None` when the date cell is empty (`"date": null`).
    Date(Option<DateValue>),
    /// A known kind whose payload could not be decoded.
    Invalid { kind: String, detail: String },
    /// Any kind the extractor does not understand (number, checkbox, ...).
    Other(String),
}

impl PropertyValue {
    /// Kind of this value, if it is one of the understood kinds.
    #[must_use]
    pub const fn kind(&self) -> Option<PropertyKind> {
        match self {
            Self::Title(_) => Some(PropertyKind::Title),
            Self::RichText(_) => Some(PropertyKind::RichText),
            Self::MultiSelect(_) => Some(PropertyKind::MultiSelect),
            Self::Date(_) => Some(PropertyKind::Date),
            Self::Invalid { .. } | Self::Other(_) => None,
        }
    }

    /// Wire name of the kind, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Invalid { kind, .. } | Self::Other(kind) => kind,
            other => other.kind().map_or("unknown", |k| k.as_str()),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Invalid {
                kind: String::new(),
                detail: "property value is not an object".to_string(),
            };
        };

        // Prefer the explicit tag; fall back to the first known payload key.
        let tag = match map.get("type").and_then(Value::as_str) {
            Some(tag) => tag.to_string(),
            None => match PropertyKind::ALL
                .into_iter()
                .find(|k| map.contains_key(k.as_str()))
            {
                Some(kind) => kind.as_str().to_string(),
                None => return Self::Other(String::new()),
            },
        };

        let Some(kind) = PropertyKind::from_tag(&tag) else {
            return Self::Other(tag);
        };
        let payload = map.remove(kind.as_str()).unwrap_or(Value::Null);

        let decoded = match kind {
            PropertyKind::Title => serde_json::from_value(payload).map(Self::Title),
            PropertyKind::RichText => serde_json::from_value(payload).map(Self::RichText),
            PropertyKind::MultiSelect => serde_json::from_value(payload).map(Self::MultiSelect),
            PropertyKind::Date => serde_json::from_value(payload).map(Self::Date),
        };

        decoded.unwrap_or_else(|e| Self::Invalid {
            kind: tag,
            detail: e.to_string(),
        })
    }
}

/// One run of rich text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,

    #[serde(default)]
    pub href: Option<String>,

    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    /// Space-join the plain text of a sequence of runs.
    #[must_use]
    pub fn join_plain(runs: &[Self]) -> String {
        runs.iter()
            .map(|t| t.plain_text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Text styling flags of a rich-text run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
}

/// One option of a multi-select cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// Value of a date cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateValue {
    pub start: String,

    #[serde(default)]
    pub end: Option<String>,
}

/// Page cover image reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum Cover {
    /// Externally hosted image.
    External { url: String },
    /// Image uploaded to the workspace (signed, expiring URL).
    File { url: String },
    /// Anything else, including a malformed reference.
    Other,
}

impl From<Value> for Cover {
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::Other;
        };
        let url = |key: &str| nested_url(&map, key);

        match map.get("type").and_then(Value::as_str) {
            Some("external") => url("external").map_or(Self::Other, |url| Self::External { url }),
            Some("file") => url("file").map_or(Self::Other, |url| Self::File { url }),
            _ => Self::Other,
        }
    }
}

fn nested_url(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)?.get("url")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(value: Value) -> PropertyValue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_tagged_title() {
        let value = prop(json!({
            "id": "title",
            "type": "title",
            "title": [{"type": "text", "plain_text": "Hello"}]
        }));
        match value {
            PropertyValue::Title(runs) => assert_eq!(runs[0].plain_text, "Hello"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_untagged_by_payload_key() {
        let value = prop(json!({"multi_select": [{"name": "go"}, {"name": "rust"}]}));
        assert_eq!(
            value,
            PropertyValue::MultiSelect(vec![
                SelectOption { name: "go".into() },
                SelectOption { name: "rust".into() },
            ])
        );
    }

    #[test]
    fn test_decode_empty_date() {
        let value = prop(json!({"type": "date", "date": null}));
        assert_eq!(value, PropertyValue::Date(None));
    }

    #[test]
    fn test_decode_wrong_shape_is_invalid() {
        let value = prop(json!({"type": "title", "title": "not a list"}));
        assert!(matches!(value, PropertyValue::Invalid { ref kind, .. } if kind == "title"));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let value = prop(json!({"type": "checkbox", "checkbox": true}));
        assert_eq!(value, PropertyValue::Other("checkbox".into()));
        assert_eq!(value.kind(), None);
        assert_eq!(value.kind_name(), "checkbox");
    }

    #[test]
    fn test_record_with_covers() {
        let record: RawRecord = serde_json::from_value(json!({
            "id": "r1",
            "last_edited_time": "2024-06-17T03:44:00.000Z",
            "properties": {},
            "cover": {"type": "external", "external": {"url": "https://img/x.png"}}
        }))
        .unwrap();
        assert_eq!(
            record.cover,
            Some(Cover::External { url: "https://img/x.png".into() })
        );

        let record: RawRecord = serde_json::from_value(json!({
            "id": "r2",
            "cover": {"type": "file", "file": {"url": "https://s3/y.png", "expiry_time": "x"}}
        }))
        .unwrap();
        assert_eq!(record.cover, Some(Cover::File { url: "https://s3/y.png".into() }));
        assert_eq!(record.last_edited_time, None);

        let record: RawRecord =
            serde_json::from_value(json!({"id": "r3", "cover": null})).unwrap();
        assert_eq!(record.cover, None);
    }

    #[test]
    fn test_join_plain() {
        let runs = vec![
            RichText {
                plain_text: "Hello".into(),
                ..Default::default()
            },
            RichText {
                plain_text: "world".into(),
                ..Default::default()
            },
        ];
        assert_eq!(RichText::join_plain(&runs), "Hello world");
        assert_eq!(RichText::join_plain(&[]), "");
    }
}
