//! CLI command implementations.

use crate::config::Config;
use crate::engine::Doccache;
use crate::handler::DeltaHandler;
use crate::metrics::{self, Metrics};
use crate::source::DeltaSource;
use crate::store::DgraphStore;
use doccache_core::{DoccacheError, Schema};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufRead;

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Connect to the backend and apply deltas until the input ends.
pub async fn cmd_run(config_path: &Path, deltas: Option<&Path>) -> Result<(), DoccacheError> {
    let config = Config::load(config_path)?;

    tracing::info!(
        "Contract {} (documents: {}, edges: {})",
        config.contract_name,
        config.doc_table_name,
        config.edge_table_name
    );
    tracing::info!("Backend admin {} data {}", config.admin_url(), config.data_url());

    let metrics = Arc::new(Metrics::new()?);
    let port = config.prometheus_port;
    let server_metrics = Arc::clone(&metrics);
    tokio::spawn(async move {
        if let Err(e) = metrics::run_server(port, server_metrics).await {
            tracing::error!("Metrics server stopped: {}", e);
        }
    });

    let store = Arc::new(DgraphStore::new(config.admin_url(), config.data_url()));
    let engine = Doccache::init(store.clone(), store, config.policy()?).await?;

    let cursor = engine.cursor().await?;
    if cursor.is_empty() {
        tracing::info!("Starting from block {}", config.start_block);
    } else {
        tracing::info!("Resuming from cursor {}", cursor);
    }

    let mut handler = DeltaHandler::new(engine, config.tables(), metrics);
    let processed = match deltas {
        Some(path) => drain(&mut handler, DeltaSource::open(path).await?).await?,
        None => drain(&mut handler, DeltaSource::stdin()).await?,
    };

    tracing::info!("Input ended after {} events", processed);
    Ok(())
}

/// Apply every event of `source` in order.
async fn drain<R: AsyncBufRead + Unpin>(
    handler: &mut DeltaHandler,
    mut source: DeltaSource<R>,
) -> Result<u64, DoccacheError> {
    let mut processed = 0u64;
    while let Some(event) = source.next_event().await? {
        handler.handle(&event).await?;
        processed += 1;
    }
    Ok(processed)
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate the configuration and print the schema it installs.
pub fn cmd_check(config_path: &Path) -> Result<(), DoccacheError> {
    let config = Config::load(config_path)?;
    let mut schema = Schema::new();
    config.policy()?.install(&mut schema)?;

    println!("Configuration OK: {}", config_path.display());
    println!("  Contract: {}", config.contract_name);
    println!("  Admin:    {}", config.admin_url());
    println!("  Data:     {}", config.data_url());
    println!("  Metrics:  0.0.0.0:{}", config.prometheus_port);
    println!();
    println!("{}", schema.sdl());
    Ok(())
}
