//! # Delta Handler
//!
//! Dispatches stream events to the engine one at a time and records the
//! outcome in the metrics.

use crate::engine::Doccache;
use crate::metrics::Metrics;
use doccache_core::{DeltaAction, DoccacheError, StreamEvent, Tables};
use std::sync::Arc;
use tracing::info;

/// Routes events to [`Doccache`] operations.
pub struct DeltaHandler {
    engine: Doccache,
    tables: Tables,
    metrics: Arc<Metrics>,
}

impl DeltaHandler {
    #[must_use]
    pub fn new(engine: Doccache, tables: Tables, metrics: Arc<Metrics>) -> Self {
        Self {
            engine,
            tables,
            metrics,
        }
    }

    /// The engine behind the handler.
    #[must_use]
    pub fn engine(&self) -> &Doccache {
        &self.engine
    }

    /// Apply one event. Returns once its commit is durable.
    pub async fn handle(&mut self, event: &StreamEvent) -> Result<(), DoccacheError> {
        let cursor = event.cursor();
        if let StreamEvent::Delta(delta) = event {
            if let Some(step) = &delta.fork_step {
                info!("Block {} fork step {}", delta.block_num, step);
            }
        }

        match DeltaAction::classify(event, &self.tables)? {
            DeltaAction::StoreDocument(doc) => {
                let op = self.engine.store_document(&doc, cursor).await?;
                self.metrics.created_docs.inc();
                info!("Stored document {} ({:?})", doc.id, op);
            }
            DeltaAction::DeleteDocument(doc) => {
                self.engine.delete_document(&doc, cursor).await?;
                self.metrics.deleted_docs.inc();
                info!("Deleted document {}", doc.id);
            }
            DeltaAction::MutateEdge { edge, is_delete } => {
                self.engine.mutate_edge(&edge, is_delete, cursor).await?;
                if is_delete {
                    self.metrics.deleted_edges.inc();
                } else {
                    self.metrics.created_edges.inc();
                }
                info!(
                    "{} edge {} {} -> {}",
                    if is_delete { "Removed" } else { "Added" },
                    edge.name,
                    edge.from,
                    edge.to
                );
            }
            DeltaAction::UpdateCursor => self.engine.update_cursor(cursor).await?,
        }

        self.metrics
            .block_number
            .set(i64::try_from(event.block_num()).unwrap_or(i64::MAX));
        Ok(())
    }
}
