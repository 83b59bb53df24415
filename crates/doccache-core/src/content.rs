//! # Content Model
//!
//! Parsed on-chain documents and edges.
//!
//! A chain document arrives as JSON table rows:
//!
//! ```json
//! {
//!   "id": 21,
//!   "hash": "8f1c…",
//!   "creator": "dao.hypha",
//!   "created_date": "2021-04-12T05:09:36.500",
//!   "content_groups": [[
//!     {"label": "content_group_label", "value": ["string", "details"]},
//!     {"label": "number", "value": ["int64", 1]}
//!   ]]
//! }
//! ```
//!
//! Every content value is decoded once, here, into a [`ContentValue`]; nothing
//! downstream looks at raw JSON again.

use crate::codec;
use crate::primitives::{CONTENT_GROUP_LABEL, MAX_LABEL_LENGTH, SYSTEM_GROUP, TYPE_LABEL};
use crate::DoccacheError;
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// PRIMITIVE CONTENT TYPES
// =============================================================================

/// The closed set of primitive content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentType {
    Asset,
    Checksum256,
    Int64,
    Name,
    TimePoint,
    String,
}

impl ContentType {
    /// All primitive types, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Asset,
        Self::Checksum256,
        Self::Int64,
        Self::Name,
        Self::TimePoint,
        Self::String,
    ];

    /// The on-chain spelling of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Checksum256 => "checksum256",
            Self::Int64 => "int64",
            Self::Name => "name",
            Self::TimePoint => "time_point",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = DoccacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("unknown content type '{s}'")))
    }
}

// =============================================================================
// CONTENT VALUES
// =============================================================================

/// A decoded content value, one variant per primitive type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValue {
    Asset(String),
    Checksum256(String),
    Int64(i64),
    Name(String),
    /// RFC 3339 timestamp, always carrying a zone.
    TimePoint(String),
    String(String),
}

impl ContentValue {
    /// Decode a raw JSON value declared as `primitive`.
    pub fn parse(primitive: ContentType, raw: &Json, label: &str) -> Result<Self, DoccacheError> {
        let invalid = || DoccacheError::InvalidContentValue {
            label: label.to_string(),
            primitive: primitive.to_string(),
            value: raw.to_string(),
        };

        match primitive {
            ContentType::Int64 => codec::parse_int64(raw).map(Self::Int64).ok_or_else(invalid),
            _ => {
                let s = raw.as_str().ok_or_else(invalid)?;
                Ok(match primitive {
                    ContentType::Asset => Self::Asset(s.to_string()),
                    ContentType::Checksum256 => Self::Checksum256(s.to_string()),
                    ContentType::Name => Self::Name(s.to_string()),
                    ContentType::TimePoint => Self::TimePoint(codec::normalize_time_point(s)),
                    _ => Self::String(s.to_string()),
                })
            }
        }
    }

    /// The primitive type of this value.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Self::Asset(_) => ContentType::Asset,
            Self::Checksum256(_) => ContentType::Checksum256,
            Self::Int64(_) => ContentType::Int64,
            Self::Name(_) => ContentType::Name,
            Self::TimePoint(_) => ContentType::TimePoint,
            Self::String(_) => ContentType::String,
        }
    }

    /// The textual payload, for every variant except `Int64`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Asset(s)
            | Self::Checksum256(s)
            | Self::Name(s)
            | Self::TimePoint(s)
            | Self::String(s) => Some(s),
            Self::Int64(_) => None,
        }
    }
}

// =============================================================================
// CONTENT ITEMS & GROUPS
// =============================================================================

/// One labeled value inside a content group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub label: String,
    pub value: ContentValue,
}

impl ContentItem {
    /// Create a new content item.
    #[must_use]
    pub fn new(label: impl Into<String>, value: ContentValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    fn from_json(raw: &Json) -> Result<Self, DoccacheError> {
        let label = raw
            .get("label")
            .and_then(Json::as_str)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("content item without label: {raw}")))?;
        validate_label(label)?;

        let pair = raw
            .get("value")
            .and_then(Json::as_array)
            .filter(|a| a.len() == 2)
            .ok_or_else(|| {
                DoccacheError::InvalidContent(format!("content item '{label}' has no [type, value] pair"))
            })?;
        let primitive: ContentType = pair[0]
            .as_str()
            .ok_or_else(|| DoccacheError::InvalidContent(format!("content item '{label}' has no type")))?
            .parse()?;

        Ok(Self {
            label: label.to_string(),
            value: ContentValue::parse(primitive, &pair[1], label)?,
        })
    }
}

/// An ordered list of content items; one of them names the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentGroup {
    pub items: Vec<ContentItem>,
}

impl ContentGroup {
    /// Create a group from items.
    #[must_use]
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    /// The value of the `content_group_label` item, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.items
            .iter()
            .find(|i| i.label == CONTENT_GROUP_LABEL)
            .and_then(|i| i.value.as_str())
    }

    /// Items other than the group label marker.
    pub fn content(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.iter().filter(|i| i.label != CONTENT_GROUP_LABEL)
    }
}

// =============================================================================
// CHAIN DOCUMENT
// =============================================================================

/// An immutable on-chain document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDocument {
    pub id: u64,
    pub hash: String,
    pub creator: String,
    /// Creation timestamp, normalized to carry a zone.
    pub created_date: String,
    pub content_groups: Vec<ContentGroup>,
}

impl ChainDocument {
    /// Decode a document table row.
    pub fn from_json(raw: &Json) -> Result<Self, DoccacheError> {
        let id = raw
            .get("id")
            .and_then(codec::parse_u64)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("document without numeric id: {raw}")))?;
        let field = |name: &str| -> Result<String, DoccacheError> {
            raw.get(name)
                .and_then(Json::as_str)
                .map(str::to_string)
                .ok_or_else(|| DoccacheError::InvalidContent(format!("document {id} has no {name}")))
        };

        let groups = raw
            .get("content_groups")
            .and_then(Json::as_array)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("document {id} has no content_groups")))?;

        let content_groups = groups
            .iter()
            .map(|g| {
                g.as_array()
                    .ok_or_else(|| {
                        DoccacheError::InvalidContent(format!("document {id} has a non-list content group"))
                    })?
                    .iter()
                    .map(ContentItem::from_json)
                    .collect::<Result<Vec<_>, _>>()
                    .map(ContentGroup::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            hash: field("hash")?,
            creator: field("creator")?,
            created_date: codec::normalize_time_point(&field("created_date")?),
            content_groups,
        })
    }

    /// The raw value of the `system.type` item.
    pub fn type_value(&self) -> Result<&str, DoccacheError> {
        self.content_groups
            .iter()
            .filter(|g| g.label() == Some(SYSTEM_GROUP))
            .flat_map(ContentGroup::content)
            .find(|i| i.label == TYPE_LABEL)
            .and_then(|i| i.value.as_str())
            .ok_or_else(|| DoccacheError::InvalidContent(format!("document {} has no system.type", self.id)))
    }
}

// =============================================================================
// CHAIN EDGE
// =============================================================================

/// An immutable named edge between two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEdge {
    pub name: String,
    pub from: u64,
    pub to: u64,
}

impl ChainEdge {
    /// Create a new edge.
    #[must_use]
    pub fn new(name: impl Into<String>, from: u64, to: u64) -> Self {
        Self {
            name: name.into(),
            from,
            to,
        }
    }

    /// Decode an edge table row (`edge_name`, `from_node`, `to_node`).
    pub fn from_json(raw: &Json) -> Result<Self, DoccacheError> {
        let pick = |keys: &[&str]| keys.iter().find_map(|k| raw.get(*k));
        let name = pick(&["edge_name", "name"])
            .and_then(Json::as_str)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("edge without name: {raw}")))?;
        validate_label(name)?;
        let from = pick(&["from_node", "from"])
            .and_then(codec::parse_u64)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("edge '{name}' without from_node")))?;
        let to = pick(&["to_node", "to"])
            .and_then(codec::parse_u64)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("edge '{name}' without to_node")))?;

        Ok(Self::new(name, from, to))
    }
}

fn validate_label(label: &str) -> Result<(), DoccacheError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(DoccacheError::InvalidContent(format!(
            "label length {} outside 1..={MAX_LABEL_LENGTH}",
            label.len()
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn period_json() -> Json {
        json!({
            "id": 21,
            "hash": "a".repeat(64),
            "creator": "dao.hypha",
            "created_date": "2021-04-12T05:09:36.500",
            "content_groups": [
                [
                    {"label": "content_group_label", "value": ["string", "details"]},
                    {"label": "number", "value": ["int64", "1"]}
                ],
                [
                    {"label": "content_group_label", "value": ["string", "system"]},
                    {"label": "type", "value": ["name", "period"]}
                ]
            ]
        })
    }

    #[test]
    fn content_type_round_trips_its_name() {
        for t in ContentType::ALL {
            assert_eq!(t.as_str().parse::<ContentType>().expect("parse"), t);
        }
        assert!("float".parse::<ContentType>().is_err());
    }

    #[test]
    fn parses_document_row() {
        let doc = ChainDocument::from_json(&period_json()).expect("parse");
        assert_eq!(doc.id, 21);
        assert_eq!(doc.created_date, "2021-04-12T05:09:36.500Z");
        assert_eq!(doc.content_groups.len(), 2);
        assert_eq!(doc.content_groups[0].label(), Some("details"));
        assert_eq!(
            doc.content_groups[0].items[1].value,
            ContentValue::Int64(1)
        );
        assert_eq!(doc.type_value().expect("type"), "period");
    }

    #[test]
    fn int64_accepts_numbers_and_strings() {
        assert_eq!(
            ContentValue::parse(ContentType::Int64, &json!(-7), "n").expect("num"),
            ContentValue::Int64(-7)
        );
        assert_eq!(
            ContentValue::parse(ContentType::Int64, &json!("42"), "n").expect("str"),
            ContentValue::Int64(42)
        );
    }

    #[test]
    fn int64_rejects_garbage() {
        let err = ContentValue::parse(ContentType::Int64, &json!("4x2"), "n").expect_err("bad");
        assert!(matches!(err, DoccacheError::InvalidContentValue { .. }));
    }

    #[test]
    fn string_types_require_json_strings() {
        assert!(ContentValue::parse(ContentType::Name, &json!(5), "n").is_err());
    }

    #[test]
    fn missing_system_type_is_invalid_content() {
        let mut raw = period_json();
        raw["content_groups"][1] = json!([
            {"label": "content_group_label", "value": ["string", "system"]}
        ]);
        let doc = ChainDocument::from_json(&raw).expect("parse");
        assert!(matches!(doc.type_value(), Err(DoccacheError::InvalidContent(_))));
    }

    #[test]
    fn unknown_primitive_is_invalid_content() {
        let mut raw = period_json();
        raw["content_groups"][0][1] = json!({"label": "x", "value": ["float", 1.5]});
        assert!(ChainDocument::from_json(&raw).is_err());
    }

    #[test]
    fn parses_edge_row() {
        let edge = ChainEdge::from_json(&json!({
            "id": 9, "from_node": "2", "to_node": 31, "edge_name": "member"
        }))
        .expect("edge");
        assert_eq!(edge, ChainEdge::new("member", 2, 31));
    }
}
