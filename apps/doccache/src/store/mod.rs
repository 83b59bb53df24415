//! # Backend Seams
//!
//! The engine talks to its backend through two traits:
//!
//! - [`SchemaAdmin`] reads and replaces the GraphQL schema
//! - [`InstanceStore`] reads instances and commits mutations together with
//!   the cursor
//!
//! [`DgraphStore`] implements both over HTTP; [`MemoryStore`] implements both
//! in process.

mod dgraph;
mod memory;

pub use dgraph::DgraphStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use doccache_core::{DoccacheError, DocumentRef, Mutation, SimplifiedInstance, SimplifiedType};
use std::collections::BTreeMap;

/// Access to the backend schema.
#[async_trait]
pub trait SchemaAdmin: Send + Sync {
    /// Current schema text; empty when none was ever pushed.
    async fn fetch_schema(&self) -> Result<String, DoccacheError>;

    /// Replace the schema.
    async fn push_schema(&self, sdl: &str) -> Result<(), DoccacheError>;
}

/// Access to persisted instances and the cursor.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Instances of `ty` by `docId` (non-list fields only).
    async fn get_instances(
        &self,
        ty: &SimplifiedType,
        doc_ids: &[String],
    ) -> Result<BTreeMap<String, SimplifiedInstance>, DoccacheError>;

    /// Documents by hash, keyed by hash.
    async fn find_by_hash(
        &self,
        hashes: &[String],
    ) -> Result<BTreeMap<String, DocumentRef>, DoccacheError>;

    /// Documents by `docId`, keyed by `docId`.
    async fn find_documents(
        &self,
        doc_ids: &[String],
    ) -> Result<BTreeMap<String, DocumentRef>, DoccacheError>;

    /// Apply `mutation` and upsert the cursor in one atomic request.
    async fn commit(&self, mutation: &Mutation, cursor: &str) -> Result<(), DoccacheError>;

    /// The persisted cursor, if any.
    async fn get_cursor(&self) -> Result<Option<String>, DoccacheError>;
}
