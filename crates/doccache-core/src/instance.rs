//! # Simplified Instances
//!
//! The typed value form of a document as it is written to and read from the
//! instance store.

use crate::codec::{self, GqlScalar};
use crate::content::ContentValue;
use crate::schema::{FieldType, SimplifiedType};
use crate::{DoccacheError, DocumentRef};
use serde_json::{Map, Value as Json, json};
use std::collections::BTreeMap;

// =============================================================================
// VALUES
// =============================================================================

/// A field value of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    /// RFC 3339 timestamp.
    DateTime(String),
    /// Single object reference, by `docId`.
    Ref(String),
    /// List of object references, by `docId`.
    Refs(Vec<String>),
}

impl Value {
    /// Whether the value is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The GraphQL input form of the value.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Null => Json::Null,
            Self::Str(s) | Self::DateTime(s) => Json::String(s.clone()),
            Self::Int(i) => json!(i),
            Self::Ref(id) => json!({ "docId": id }),
            Self::Refs(ids) => Json::Array(ids.iter().map(|id| json!({ "docId": id })).collect()),
        }
    }

    /// Decode a stored value declared with `field_type`.
    pub fn from_json(field_type: &FieldType, is_array: bool, raw: &Json) -> Result<Self, DoccacheError> {
        if raw.is_null() {
            return Ok(Self::Null);
        }
        let bad = || DoccacheError::InstanceStoreFailure(format!("unexpected {} value {raw}", field_type.name()));
        let ref_id = |r: &Json| r.get("docId").and_then(Json::as_str).map(str::to_string);

        match field_type {
            FieldType::Scalar(GqlScalar::Int64) => codec::parse_int64(raw).map(Self::Int).ok_or_else(bad),
            FieldType::Scalar(GqlScalar::DateTime) => raw.as_str().map(|s| Self::DateTime(s.to_string())).ok_or_else(bad),
            FieldType::Scalar(GqlScalar::String) => raw.as_str().map(|s| Self::Str(s.to_string())).ok_or_else(bad),
            FieldType::Object(_) if is_array => raw
                .as_array()
                .ok_or_else(bad)?
                .iter()
                .map(|r| ref_id(r).ok_or_else(bad))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Refs),
            FieldType::Object(_) => ref_id(raw).map(Self::Ref).ok_or_else(bad),
        }
    }
}

impl From<&ContentValue> for Value {
    fn from(v: &ContentValue) -> Self {
        match v {
            ContentValue::Int64(i) => Self::Int(*i),
            ContentValue::TimePoint(t) => Self::DateTime(t.clone()),
            ContentValue::Asset(s)
            | ContentValue::Checksum256(s)
            | ContentValue::Name(s)
            | ContentValue::String(s) => Self::Str(s.clone()),
        }
    }
}

impl From<&DocumentRef> for Value {
    fn from(r: &DocumentRef) -> Self {
        Self::Ref(r.doc_id.clone())
    }
}

// =============================================================================
// INSTANCE
// =============================================================================

/// A document projected onto an induced type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedInstance {
    pub type_name: String,
    pub values: BTreeMap<String, Value>,
}

impl SimplifiedInstance {
    /// Create an empty instance.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Get a value; absent fields read as `None`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// Whether the field carries a non-null value.
    #[must_use]
    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_null())
    }

    /// The GraphQL input object of the non-null values.
    #[must_use]
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.values
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<_, _>>(),
        )
    }

    /// Decode a stored object according to the fields of `ty`.
    ///
    /// Keys that are not fields of `ty` are ignored.
    pub fn from_json(ty: &SimplifiedType, raw: &Json) -> Result<Self, DoccacheError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| DoccacheError::InstanceStoreFailure(format!("{} instance is not an object", ty.name)))?;
        let mut instance = Self::new(&ty.name);
        for (key, value) in obj {
            if let Some(f) = ty.field(key) {
                instance.set(key.clone(), Value::from_json(&f.field_type, f.is_array, value)?);
            }
        }
        Ok(instance)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentType;
    use crate::schema::SimplifiedField;

    #[test]
    fn values_render_graphql_input() {
        assert_eq!(Value::Int(5).to_json(), json!(5));
        assert_eq!(Value::Ref("21".into()).to_json(), json!({"docId": "21"}));
        assert_eq!(
            Value::Refs(vec!["1".into(), "2".into()]).to_json(),
            json!([{"docId": "1"}, {"docId": "2"}])
        );
    }

    #[test]
    fn null_values_are_omitted_from_input() {
        let mut i = SimplifiedInstance::new("Period");
        i.set("a", Value::Null);
        i.set("b", Value::Str("x".into()));
        assert_eq!(i.to_json(), json!({"b": "x"}));
        assert!(!i.has_value("a"));
        assert!(i.has_value("b"));
    }

    #[test]
    fn reads_stored_object_by_type() {
        let mut ty = SimplifiedType::document("Dho");
        ty.insert(SimplifiedField::from_content("details_number_i", ContentType::Int64));
        ty.insert(SimplifiedField::core_edge("details_startPeriod_c_edge", "Period"));
        ty.insert(SimplifiedField::edge("member", "Member"));
        let raw = json!({
            "docId": "2",
            "details_number_i": "7",
            "details_startPeriod_c_edge": {"docId": "21"},
            "member": [{"docId": "31"}],
            "unknown": 1,
        });
        let i = SimplifiedInstance::from_json(&ty, &raw).expect("decode");
        assert_eq!(i.get("details_number_i"), Some(&Value::Int(7)));
        assert_eq!(i.get("details_startPeriod_c_edge"), Some(&Value::Ref("21".into())));
        assert_eq!(i.get("member"), Some(&Value::Refs(vec!["31".into()])));
        assert!(i.get("unknown").is_none());
    }

    #[test]
    fn rejects_mistyped_store_values() {
        let f = FieldType::Scalar(GqlScalar::String);
        assert!(Value::from_json(&f, false, &json!(3)).is_err());
        assert_eq!(Value::from_json(&f, false, &Json::Null).expect("null"), Value::Null);
    }
}
