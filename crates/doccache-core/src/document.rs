//! # Document Projection
//!
//! Turns a [`ChainDocument`] into the type it induces and the instance that
//! carries its values.
//!
//! Projection is pure: core edges are not resolved here (see
//! [`crate::edges`]), only the checksum fields that may back them are
//! collected.

use crate::codec;
use crate::content::{ChainDocument, ContentType, ContentValue};
use crate::instance::{SimplifiedInstance, Value};
use crate::primitives::{
    CONTENT_GROUP_LABEL, CREATED_DATE, CREATOR, CURSOR_TYPE, DOC_ID, DOC_ID_INT,
    DOCUMENT_INTERFACE, HASH, SYSTEM_GROUP, TYPE, TYPE_LABEL,
};
use crate::schema::{SimplifiedField, SimplifiedType};
use crate::DoccacheError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// TYPE MAPPINGS
// =============================================================================

/// Overrides the induced type name of documents carrying specific labels.
///
/// A mapping matches when, for every listed group, every listed content label
/// is present in a group with that label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    #[serde(rename = "type")]
    pub type_name: String,
    pub labels: BTreeMap<String, Vec<String>>,
}

impl TypeMapping {
    /// Whether the mapping applies to `doc`.
    #[must_use]
    pub fn matches(&self, doc: &ChainDocument) -> bool {
        self.labels.iter().all(|(group, labels)| {
            labels.iter().all(|label| {
                doc.content_groups
                    .iter()
                    .filter(|g| g.label() == Some(group.as_str()))
                    .flat_map(|g| g.content())
                    .any(|i| &i.label == label)
            })
        })
    }
}

// =============================================================================
// PARSED DOCUMENT
// =============================================================================

/// A checksum field whose value may link to another document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRef {
    /// Induced field name of the checksum item.
    pub field: String,
    /// Referenced document hash.
    pub hash: String,
}

/// The projection of one chain document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Type induced by the document alone.
    pub ty: SimplifiedType,
    pub instance: SimplifiedInstance,
    pub checksums: Vec<ChecksumRef>,
}

impl ParsedDocument {
    /// Project `doc`; the first matching mapping names the type.
    pub fn parse(doc: &ChainDocument, mappings: &[TypeMapping]) -> Result<Self, DoccacheError> {
        let raw_type = match mappings.iter().find(|m| m.matches(doc)) {
            Some(m) => m.type_name.as_str(),
            None => doc.type_value()?,
        };
        let type_name = codec::type_name(raw_type);
        if !type_name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(DoccacheError::InvalidContent(format!(
                "document {} has type '{raw_type}', which is not a GraphQL name",
                doc.id
            )));
        }
        if type_name == CURSOR_TYPE || type_name == DOCUMENT_INTERFACE {
            return Err(DoccacheError::InvalidContent(format!(
                "document {} uses the reserved type '{type_name}'",
                doc.id
            )));
        }

        let mut ty = SimplifiedType::document(&type_name);
        let mut instance = SimplifiedInstance::new(&type_name);
        let mut checksums = Vec::new();

        let doc_id = doc.id.to_string();
        let doc_id_int = i64::try_from(doc.id).map_err(|_| {
            DoccacheError::InvalidContent(format!("document id {} exceeds Int64", doc.id))
        })?;
        instance.set(DOC_ID, Value::Str(doc_id));
        instance.set(DOC_ID_INT, Value::Int(doc_id_int));
        instance.set(HASH, Value::Str(doc.hash.clone()));
        instance.set(TYPE, Value::Str(type_name.clone()));
        instance.set(CREATOR, Value::Str(doc.creator.clone()));
        instance.set(CREATED_DATE, Value::DateTime(doc.created_date.clone()));

        for group in &doc.content_groups {
            let group_label = group.label().ok_or_else(|| {
                DoccacheError::InvalidContent(format!(
                    "document {} has a content group without {CONTENT_GROUP_LABEL}",
                    doc.id
                ))
            })?;
            for item in group.content() {
                if group_label == SYSTEM_GROUP && item.label == TYPE_LABEL {
                    continue;
                }
                let t = item.value.content_type();
                let name = codec::field_name(group_label, &item.label, t);
                // A repeated label overwrites the earlier item.
                checksums.retain(|c: &ChecksumRef| c.field != name);
                if let ContentValue::Checksum256(hash) = &item.value {
                    checksums.push(ChecksumRef {
                        field: name.clone(),
                        hash: hash.clone(),
                    });
                }
                ty.insert(SimplifiedField::from_content(&name, t));
                instance.set(name, Value::from(&item.value));
            }
        }

        Ok(Self {
            ty,
            instance,
            checksums,
        })
    }

    /// Induced type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    /// `docId` of the projected instance.
    #[must_use]
    pub fn doc_id(&self) -> Option<&str> {
        match self.instance.get(DOC_ID) {
            Some(Value::Str(id)) => Some(id),
            _ => None,
        }
    }
}

/// Primitive type encoded by an induced field name's suffix.
#[must_use]
pub fn content_type_of(field_name: &str) -> Option<ContentType> {
    let suffix = field_name.rsplit('_').next()?;
    ContentType::ALL
        .into_iter()
        .find(|t| codec::suffix(*t) == suffix)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::GqlScalar;
    use crate::schema::FieldType;
    use serde_json::json;

    fn doc(groups: serde_json::Value) -> ChainDocument {
        ChainDocument::from_json(&json!({
            "id": 2,
            "hash": "b".repeat(64),
            "creator": "dao.hypha",
            "created_date": "2021-04-12T05:09:36.500",
            "content_groups": groups,
        }))
        .expect("doc")
    }

    fn dho() -> ChainDocument {
        doc(json!([
            [
                {"label": "content_group_label", "value": ["string", "details"]},
                {"label": "start_period", "value": ["checksum256", "a".repeat(64)]},
                {"label": "name", "value": ["name", "hypha"]}
            ],
            [
                {"label": "content_group_label", "value": ["string", "system"]},
                {"label": "type", "value": ["name", "dho"]}
            ]
        ]))
    }

    #[test]
    fn projects_base_and_content_fields() {
        let parsed = ParsedDocument::parse(&dho(), &[]).expect("parse");
        assert_eq!(parsed.type_name(), "Dho");
        assert_eq!(parsed.doc_id(), Some("2"));
        assert_eq!(parsed.instance.get(TYPE), Some(&Value::Str("Dho".into())));
        assert_eq!(parsed.instance.get(DOC_ID_INT), Some(&Value::Int(2)));
        let f = parsed.ty.field("details_startPeriod_c").expect("checksum field");
        assert_eq!(f.field_type, FieldType::Scalar(GqlScalar::String));
        assert!(!parsed.ty.has_field("system_type_n"));
        assert_eq!(parsed.checksums.len(), 1);
        assert_eq!(parsed.checksums[0].field, "details_startPeriod_c");
    }

    #[test]
    fn missing_group_label_is_invalid() {
        let bad = doc(json!([
            [{"label": "number", "value": ["int64", 1]}],
            [
                {"label": "content_group_label", "value": ["string", "system"]},
                {"label": "type", "value": ["name", "period"]}
            ]
        ]));
        assert!(matches!(
            ParsedDocument::parse(&bad, &[]),
            Err(DoccacheError::InvalidContent(_))
        ));
    }

    #[test]
    fn missing_type_is_invalid() {
        let bad = doc(json!([[
            {"label": "content_group_label", "value": ["string", "details"]}
        ]]));
        assert!(ParsedDocument::parse(&bad, &[]).is_err());
    }

    #[test]
    fn type_must_be_a_graphql_name() {
        for raw in ["1st_period", "", "cursor", "document"] {
            let bad = doc(json!([[
                {"label": "content_group_label", "value": ["string", "system"]},
                {"label": "type", "value": ["name", raw]}
            ]]));
            assert!(
                matches!(ParsedDocument::parse(&bad, &[]), Err(DoccacheError::InvalidContent(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn type_mapping_overrides_name() {
        let mapping = TypeMapping {
            type_name: "Organization".into(),
            labels: BTreeMap::from([("details".to_string(), vec!["name".to_string()])]),
        };
        let parsed = ParsedDocument::parse(&dho(), &[mapping]).expect("parse");
        assert_eq!(parsed.type_name(), "Organization");

        let unmatched = TypeMapping {
            type_name: "Organization".into(),
            labels: BTreeMap::from([("details".to_string(), vec!["owner".to_string()])]),
        };
        let parsed = ParsedDocument::parse(&dho(), &[unmatched]).expect("parse");
        assert_eq!(parsed.type_name(), "Dho");
    }

    #[test]
    fn suffix_decodes_content_type() {
        assert_eq!(content_type_of("details_name_n"), Some(ContentType::Name));
        assert_eq!(content_type_of("details_startPeriod_c"), Some(ContentType::Checksum256));
        assert_eq!(content_type_of("plain"), None);
    }
}
