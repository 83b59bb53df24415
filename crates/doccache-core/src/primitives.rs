//! # Innate Primitives
//!
//! Hardcoded names and limits shared by every Doccache component.
//!
//! The induced schema starts empty but the built-in vocabulary is fixed:
//! the `Document` interface, the `Cursor` singleton and the labels that
//! structure an on-chain document are compiled into the binary.

// =============================================================================
// DOCUMENT VOCABULARY
// =============================================================================

/// Label of the content item that names its content group.
pub const CONTENT_GROUP_LABEL: &str = "content_group_label";

/// Group that carries the document type item.
pub const SYSTEM_GROUP: &str = "system";

/// Label of the item (inside [`SYSTEM_GROUP`]) whose value names the document type.
pub const TYPE_LABEL: &str = "type";

/// Suffix appended to a checksum field to name its core edge.
pub const CORE_EDGE_SUFFIX: &str = "_edge";

// =============================================================================
// BUILT-IN SCHEMA
// =============================================================================

/// The interface every induced type implements.
pub const DOCUMENT_INTERFACE: &str = "Document";

/// Built-in type holding the stream position.
pub const CURSOR_TYPE: &str = "Cursor";

/// Primary key of the cursor singleton.
pub const CURSOR_ID: &str = "c1";

/// Document base field: string form of the chain id (primary key).
pub const DOC_ID: &str = "docId";

/// Document base field: numeric chain id.
pub const DOC_ID_INT: &str = "docId_i";

/// Document base field: 64-hex content hash.
pub const HASH: &str = "hash";

/// Document base field: induced type name.
pub const TYPE: &str = "type";

/// Document base field: account that created the document.
pub const CREATOR: &str = "creator";

/// Document base field: creation timestamp.
pub const CREATED_DATE: &str = "createdDate";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a label (group label, content label, edge name).
///
/// Labels longer than this are rejected as invalid content.
pub const MAX_LABEL_LENGTH: usize = 256;

/// Maximum number of ids in a single `in` filter.
pub const MAX_IDS_PER_QUERY: usize = 1000;
