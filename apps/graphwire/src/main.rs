//! # Graphwire - Graph Replication Toolkit
//!
//! The main binary for the graphwire event-sourced graph replicator.
//!
//! This application provides:
//! - A name registry service for endpoint discovery
//! - A publisher that replicates a locally mutated graph to remote mirrors
//! - A mirror that maintains a local replica of a published graph
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                   apps/graphwire (THE BINARY)                  │
//! │                                                                │
//! │   ┌───────────┐     ┌────────────┐     ┌──────────────────┐   │
//! │   │ registry  │     │  publish   │     │      mirror      │   │
//! │   │  (names)  │     │ (producer) │     │    (consumer)    │   │
//! │   └─────┬─────┘     └─────┬──────┘     └────────┬─────────┘   │
//! │         │                 │                     │             │
//! │         └────────┬────────┴──────────┬──────────┘             │
//! │                  ▼                   ▼                        │
//! │         ┌───────────────┐   ┌────────────────┐                │
//! │         │ graphwire-net │──▶│ graphwire-core │                │
//! │         │  (THE WIRE)   │   │  (THE LOGIC)   │                │
//! │         └───────────────┘   └────────────────┘                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start a registry
//! graphwire registry --host 127.0.0.1 --port 9400
//!
//! # Publish a graph under a name, mutations read from stdin
//! graphwire publish //127.0.0.1:9400/demo < mutations.jsonl
//!
//! # Mirror it elsewhere
//! graphwire mirror //127.0.0.1:9400/demo
//! ```

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — GRAPHWIRE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("GRAPHWIRE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "graphwire=debug"
    } else {
        "graphwire=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

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

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
