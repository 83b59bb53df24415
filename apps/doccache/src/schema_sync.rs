//! # Schema Synchronization
//!
//! Owns the in-memory [`Schema`] and keeps the backend's copy equal to it.
//! Every change reported by the core is pushed before any instance that
//! depends on it is written.

use crate::store::SchemaAdmin;
use doccache_core::{DoccacheError, Policy, Schema, SimplifiedType, UpdateOp};
use std::sync::Arc;
use tracing::{debug, info};

/// The schema plus the admin endpoint it is mirrored to.
pub struct SchemaSync {
    schema: Schema,
    admin: Arc<dyn SchemaAdmin>,
}

impl SchemaSync {
    /// Load the backend schema, install the configured interfaces and push
    /// the result when it differs from what the backend holds.
    pub async fn init(admin: Arc<dyn SchemaAdmin>, policy: &Policy) -> Result<Self, DoccacheError> {
        let remote = admin.fetch_schema().await?;
        let (schema, mut dirty) = if remote.trim().is_empty() {
            info!("Backend has no schema, starting from the builtins");
            (Schema::new(), true)
        } else {
            let schema = Schema::parse(&remote)?;
            let differs = schema.render().trim() != remote.trim();
            (schema, differs)
        };

        let mut sync = Self { schema, admin };
        dirty |= policy.install(&mut sync.schema)?;
        if dirty {
            sync.push().await?;
        }
        info!(
            "Schema ready: {} types, {} interfaces",
            sync.schema.types().count(),
            sync.schema.interfaces().count()
        );
        Ok(sync)
    }

    /// The current schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Merge a type and push when the schema changed.
    pub async fn update_type(&mut self, ty: SimplifiedType) -> Result<UpdateOp, DoccacheError> {
        let name = ty.name.clone();
        let op = self.schema.update_type(ty)?;
        if op.changed() {
            debug!("Type {} {:?}", name, op);
            self.push().await?;
        }
        Ok(op)
    }

    /// Add or generalize a list edge and push when the schema changed.
    pub async fn add_edge(
        &mut self,
        type_name: &str,
        edge_name: &str,
        target: &str,
    ) -> Result<bool, DoccacheError> {
        let changed = self.schema.add_edge(type_name, edge_name, target)?;
        if changed {
            debug!("Edge {}.{} -> {}", type_name, edge_name, target);
            self.push().await?;
        }
        Ok(changed)
    }

    /// Replace the backend schema and read it back.
    async fn push(&mut self) -> Result<(), DoccacheError> {
        let sdl = self.schema.sdl().to_string();
        self.admin.push_schema(&sdl).await?;
        let stored = self.admin.fetch_schema().await?;
        if stored.trim() != sdl.trim() {
            return Err(DoccacheError::SchemaSyncFailure(
                "backend schema differs from the pushed schema".to_string(),
            ));
        }
        info!("Schema pushed ({} bytes)", sdl.len());
        Ok(())
    }
}
