//! # doccache-core
//!
//! The schema-induction and document-projection engine for Doccache.
//!
//! On-chain documents are untyped bags of labeled content groups. This crate
//! derives a typed GraphQL schema from them as they arrive, keeps that schema
//! growing monotonically, and maps every document onto an instance of its
//! induced type, ready to be written to a GraphQL graph database.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network. The app crate performs the round trips;
//!   this crate decides what they contain.
//! - Deterministic: `BTreeMap` everywhere, so the rendered schema and every
//!   request body are byte-stable for the same input.
//! - Add-only: the schema model never removes or tightens a field.

// =============================================================================
// MODULES
// =============================================================================

pub mod codec;
pub mod content;
pub mod delta;
pub mod document;
pub mod edges;
pub mod instance;
pub mod mutation;
pub mod policy;
pub mod primitives;
pub mod schema;
pub mod statements;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{DoccacheError, DocumentRef, UpdateOp};

// =============================================================================
// RE-EXPORTS: Engine Building Blocks
// =============================================================================

pub use codec::{GqlScalar, SearchIndex};
pub use content::{ChainDocument, ChainEdge, ContentGroup, ContentItem, ContentType, ContentValue};
pub use delta::{DeltaAction, StreamEvent, Tables};
pub use document::{ParsedDocument, TypeMapping};
pub use instance::{SimplifiedInstance, Value};
pub use mutation::Mutation;
pub use policy::Policy;
pub use schema::{FieldType, Schema, SimplifiedField, SimplifiedInterface, SimplifiedType};
pub use statements::GqlRequest;
