//! # Core Type Definitions
//!
//! Shared value types and the error enum for Doccache:
//! - Document references returned by store lookups (`DocumentRef`)
//! - The schema mutation outcome (`UpdateOp`)
//! - Error types (`DoccacheError`)

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// DOCUMENT REFERENCES
// =============================================================================

/// A persisted document as seen through the `Document` interface.
///
/// This is what hash and docId lookups return: enough to link to the
/// document and to know which induced type it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// String form of the chain id.
    #[serde(rename = "docId")]
    pub doc_id: String,
    /// Induced type name of the document.
    #[serde(rename = "type")]
    pub type_name: String,
}

impl DocumentRef {
    /// Create a new document reference.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            type_name: type_name.into(),
        }
    }
}

// =============================================================================
// SCHEMA OPERATION OUTCOME
// =============================================================================

/// Result of merging a type into the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// The schema already contained everything.
    None,
    /// The type did not exist and was installed.
    Created,
    /// The type existed and gained fields, relaxations or interfaces.
    Updated,
}

impl UpdateOp {
    /// Whether the schema changed and must be pushed.
    #[must_use]
    pub const fn changed(self) -> bool {
        !matches!(self, Self::None)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Doccache system.
///
/// Every variant is fatal for the delta being processed: the process stops
/// and resumes from the last durable cursor.
#[derive(Debug, Error)]
pub enum DoccacheError {
    /// A document violates the content encoding (missing group label, missing type).
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// A content value cannot be decoded as its declared primitive type.
    #[error("Invalid {primitive} value for '{label}': {value}")]
    InvalidContentValue {
        label: String,
        primitive: String,
        value: String,
    },

    /// A configured logical id field is missing on the document creating its type.
    #[error("Type {type_name} is missing logical id field {field}")]
    MissingLogicalId { type_name: String, field: String },

    /// An edge cannot be retargeted to the requested type.
    #[error("Edge {type_name}.{field} targets {existing}, cannot accept {requested}")]
    IncompatibleEdgeTarget {
        type_name: String,
        field: String,
        existing: String,
        requested: String,
    },

    /// A non-null field cannot be added to an existing type.
    #[error("Cannot add non-null field {field} to existing type {type_name}")]
    NonNullAddition { type_name: String, field: String },

    /// A field update violates the compatibility rules.
    #[error("Incompatible update of {type_name}.{field}: {reason}")]
    IncompatibleField {
        type_name: String,
        field: String,
        reason: String,
    },

    /// An edge delta references a document that is not in the store.
    #[error("Edge endpoint not found: document {0}")]
    MissingEndpoint(String),

    /// The requested type is not part of the schema.
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// An interface definition cannot be used.
    #[error("Invalid interface {name}: {reason}")]
    InvalidInterface { name: String, reason: String },

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The upstream delta cannot be applied.
    #[error("Invalid delta: {0}")]
    InvalidDelta(String),

    /// The remote schema text cannot be read back into the schema model.
    #[error("Schema parse error at line {line}: {message}")]
    SchemaParse { line: usize, message: String },

    /// The backend rejected the pushed schema.
    #[error("Schema rejected by backend: {0}")]
    SchemaIncompatible(String),

    /// The schema could not be read or written.
    #[error("Schema synchronization failed: {0}")]
    SchemaSyncFailure(String),

    /// An instance read or write failed.
    #[error("Instance store failure: {0}")]
    InstanceStoreFailure(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl DoccacheError {
    /// Shorthand for an [`DoccacheError::IncompatibleField`].
    pub(crate) fn incompatible(type_name: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::IncompatibleField {
            type_name: type_name.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DoccacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_op_changed() {
        assert!(!UpdateOp::None.changed());
        assert!(UpdateOp::Created.changed());
        assert!(UpdateOp::Updated.changed());
    }

    #[test]
    fn document_ref_serializes_graphql_names() {
        let r = DocumentRef::new("21", "Period");
        let json = serde_json::to_value(&r).expect("serialize");
        assert_eq!(json["docId"], "21");
        assert_eq!(json["type"], "Period");
    }

    #[test]
    fn error_messages_name_the_field() {
        let e = DoccacheError::MissingLogicalId {
            type_name: "Dho".into(),
            field: "details_name_n".into(),
        };
        assert!(e.to_string().contains("details_name_n"));
    }
}
