//! # Doccache
//!
//! Projects documents and edges from an on-chain contract into a Dgraph
//! graph database, inducing its GraphQL schema as new shapes appear.
//!
//! ## Usage
//!
//! ```bash
//! doccache config.yml --deltas deltas.ndjson
//! DOCCACHE_LOG_FORMAT=json doccache config.yml < deltas.ndjson
//! ```

use clap::Parser;
use doccache::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // DOCCACHE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("DOCCACHE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "doccache=info,tower_http=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.check {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Doccache startup banner.
fn print_banner() {
    println!(
        r#"
  doccache v{}
  documents in, graph out
"#,
        env!("CARGO_PKG_VERSION")
    );
}
