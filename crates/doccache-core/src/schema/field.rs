//! Simplified fields.

use crate::codec::{self, GqlScalar, SearchIndex};
use crate::content::ContentType;
use crate::primitives::{CREATED_DATE, CREATOR, DOC_ID, DOC_ID_INT, HASH, TYPE};

/// The type of a field: a scalar or a reference to an object type/interface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    Scalar(GqlScalar),
    Object(String),
}

impl FieldType {
    /// SDL name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.as_str(),
            Self::Object(o) => o,
        }
    }
}

/// A field of a simplified type or interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedField {
    pub name: String,
    pub field_type: FieldType,
    pub non_null: bool,
    pub is_array: bool,
    pub is_id: bool,
    pub index: Option<SearchIndex>,
}

impl SimplifiedField {
    /// A nullable scalar field.
    #[must_use]
    pub fn scalar(name: impl Into<String>, scalar: GqlScalar, index: Option<SearchIndex>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Scalar(scalar),
            non_null: false,
            is_array: false,
            is_id: false,
            index,
        }
    }

    /// The nullable field induced for a content item of type `t`.
    #[must_use]
    pub fn from_content(name: impl Into<String>, t: ContentType) -> Self {
        Self::scalar(name, codec::gql_scalar(t), Some(codec::index(t)))
    }

    /// A list edge to `target` (chain edges, interface edges).
    #[must_use]
    pub fn edge(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Object(target.into()),
            non_null: false,
            is_array: true,
            is_id: false,
            index: None,
        }
    }

    /// A single-valued core edge to `target`.
    #[must_use]
    pub fn core_edge(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            is_array: false,
            ..Self::edge(name, target)
        }
    }

    /// Mark the field non-null.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.non_null = true;
        self
    }

    /// Promote the field to a primary key (implies non-null).
    #[must_use]
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.non_null = true;
        self
    }

    /// Object target of the field, if it is not a scalar.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::Object(o) => Some(o),
            FieldType::Scalar(_) => None,
        }
    }

    /// Whether the field references an object type.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.target().is_some()
    }

    /// Whether the field is a list edge.
    #[must_use]
    pub fn is_edge(&self) -> bool {
        self.is_array && self.is_object()
    }
}

/// Fields contributed by the built-in `Document` interface.
#[must_use]
pub fn document_fields() -> Vec<SimplifiedField> {
    vec![
        SimplifiedField::scalar(DOC_ID, GqlScalar::String, Some(SearchIndex::Exact)).id(),
        SimplifiedField::scalar(DOC_ID_INT, GqlScalar::Int64, Some(SearchIndex::Int64)).required(),
        SimplifiedField::scalar(HASH, GqlScalar::String, Some(SearchIndex::Exact)).required(),
        SimplifiedField::scalar(TYPE, GqlScalar::String, Some(SearchIndex::Exact)).required(),
        SimplifiedField::scalar(CREATOR, GqlScalar::String, Some(SearchIndex::Exact)).required(),
        SimplifiedField::scalar(CREATED_DATE, GqlScalar::DateTime, Some(SearchIndex::Hour))
            .required(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_fields_are_nullable_and_indexed() {
        let f = SimplifiedField::from_content("details_number_i", ContentType::Int64);
        assert!(!f.non_null);
        assert_eq!(f.field_type, FieldType::Scalar(GqlScalar::Int64));
        assert_eq!(f.index, Some(SearchIndex::Int64));
    }

    #[test]
    fn id_implies_non_null() {
        let f = SimplifiedField::from_content("details_name_n", ContentType::Name).id();
        assert!(f.is_id && f.non_null);
    }

    #[test]
    fn edges_and_core_edges() {
        let e = SimplifiedField::edge("member", "Member");
        assert!(e.is_edge());
        let c = SimplifiedField::core_edge("details_startPeriod_c_edge", "Period");
        assert!(c.is_object() && !c.is_edge());
        assert_eq!(c.target(), Some("Period"));
    }

    #[test]
    fn document_base_has_six_fields() {
        let fields = document_fields();
        assert_eq!(fields.len(), 6);
        assert!(fields.iter().any(|f| f.name == DOC_ID && f.is_id));
    }
}
