//! # Doccache
//!
//! The ingestion process: consumes contract table deltas, projects documents
//! and edges through `doccache-core`, and keeps a Dgraph GraphQL backend in
//! sync with the induced schema.
//!
//! ```text
//!  NDJSON deltas ─▶ DeltaHandler ─▶ Doccache ─▶ SchemaSync ─▶ /admin
//!                        │              └────▶ InstanceStore ─▶ /graphql
//!                        ▼
//!                     Metrics ─▶ GET /metrics
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod handler;
pub mod metrics;
pub mod schema_sync;
pub mod source;
pub mod store;
