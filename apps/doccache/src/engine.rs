//! # Doccache Engine
//!
//! Applies documents, edges and cursor positions to the backend. Each
//! operation ends with exactly one commit that carries the domain mutation
//! and the new cursor together, after any schema change it needs was pushed.

use crate::schema_sync::SchemaSync;
use crate::store::{InstanceStore, SchemaAdmin};
use doccache_core::{
    ChainDocument, ChainEdge, DoccacheError, Mutation, Policy, Schema, UpdateOp, codec, edges,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// The projection engine.
pub struct Doccache {
    sync: SchemaSync,
    store: Arc<dyn InstanceStore>,
    policy: Policy,
}

impl Doccache {
    /// Synchronize the schema and make sure a cursor exists.
    pub async fn init(
        admin: Arc<dyn SchemaAdmin>,
        store: Arc<dyn InstanceStore>,
        policy: Policy,
    ) -> Result<Self, DoccacheError> {
        let sync = SchemaSync::init(admin, &policy).await?;
        if store.get_cursor().await?.is_none() {
            info!("No cursor stored, creating an empty one");
            store.commit(&Mutation::CursorOnly, "").await?;
        }
        Ok(Self {
            sync,
            store,
            policy,
        })
    }

    /// The current schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        self.sync.schema()
    }

    /// The persisted cursor; empty when nothing was processed yet.
    pub async fn cursor(&self) -> Result<String, DoccacheError> {
        Ok(self.store.get_cursor().await?.unwrap_or_default())
    }

    /// Project a document, evolve the schema and upsert the instance.
    pub async fn store_document(
        &mut self,
        doc: &ChainDocument,
        cursor: &str,
    ) -> Result<UpdateOp, DoccacheError> {
        let mut parsed = self.policy.parse(doc)?;

        let hashes = edges::pending_lookups(&parsed);
        let found = if hashes.is_empty() {
            BTreeMap::new()
        } else {
            self.store.find_by_hash(&hashes).await?
        };
        edges::resolve(&mut parsed, self.sync.schema(), &found);
        self.policy.apply(self.sync.schema(), &mut parsed)?;

        let type_name = parsed.type_name().to_string();
        let doc_id = parsed
            .doc_id()
            .map(str::to_string)
            .ok_or_else(|| DoccacheError::InvalidContent(format!("document {} has no docId", doc.id)))?;

        let op = self.sync.update_type(parsed.ty.clone()).await?;
        let ty = self
            .sync
            .schema()
            .get_type(&type_name)
            .cloned()
            .ok_or_else(|| DoccacheError::TypeNotFound(type_name.clone()))?;

        let old = if op == UpdateOp::Created {
            None
        } else {
            self.store
                .get_instances(&ty, std::slice::from_ref(&doc_id))
                .await?
                .remove(&doc_id)
        };

        let mutation = Mutation::store(&ty, parsed.instance, old.as_ref())?;
        self.store.commit(&mutation, cursor).await?;
        debug!("Stored {} {} ({:?})", type_name, doc_id, op);
        Ok(op)
    }

    /// Delete the instance projected from `doc`.
    pub async fn delete_document(
        &self,
        doc: &ChainDocument,
        cursor: &str,
    ) -> Result<(), DoccacheError> {
        let parsed = self.policy.parse(doc)?;
        let type_name = parsed.type_name();
        let doc_id = doc.id.to_string();

        if self.sync.schema().get_type(type_name).is_none() {
            debug!("Delete of {} {} before its type exists", type_name, doc_id);
            return self.update_cursor(cursor).await;
        }
        self.store
            .commit(&Mutation::delete(type_name, &doc_id), cursor)
            .await?;
        debug!("Deleted {} {}", type_name, doc_id);
        Ok(())
    }

    /// Add or remove one entry of a list edge.
    pub async fn mutate_edge(
        &mut self,
        edge: &ChainEdge,
        is_delete: bool,
        cursor: &str,
    ) -> Result<(), DoccacheError> {
        let from_id = edge.from.to_string();
        let to_id = edge.to.to_string();
        let found = self
            .store
            .find_documents(&[from_id.clone(), to_id.clone()])
            .await?;
        let endpoint = |id: &str, role: &str| {
            found.get(id).cloned().ok_or_else(|| {
                DoccacheError::MissingEndpoint(format!("{id} ({role} of {})", edge.name))
            })
        };
        let from = endpoint(&from_id, "from")?;
        let to = endpoint(&to_id, "to")?;

        let field = codec::edge_field_name(&edge.name);
        self.sync.add_edge(&from.type_name, &field, &to.type_name).await?;

        let mutation = Mutation::edge(&from.type_name, &from.doc_id, &field, &to.doc_id, is_delete);
        self.store.commit(&mutation, cursor).await?;
        debug!(
            "{} edge {}.{} {} -> {}",
            if is_delete { "Removed" } else { "Added" },
            from.type_name,
            field,
            from.doc_id,
            to.doc_id
        );
        Ok(())
    }

    /// Persist a new cursor without any other change.
    pub async fn update_cursor(&self, cursor: &str) -> Result<(), DoccacheError> {
        self.store.commit(&Mutation::CursorOnly, cursor).await
    }
}
