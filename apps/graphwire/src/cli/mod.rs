//! # Graphwire CLI Module
//!
//! ## Available Commands
//!
//! - `registry` - Run the name registry service
//! - `publish` - Publish a graph under a name, mutations read from stdin
//! - `mirror` - Maintain a local replica of a published graph

mod commands;

use clap::{Parser, Subcommand};
use graphwire_core::GraphwireError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Graphwire - Graph Replication Toolkit
///
/// An event-sourced attributed graph that replicates across threads and
/// processes. Every mutation becomes a stamped event; mirrors converge by
/// consuming the stream.
#[derive(Parser, Debug)]
#[command(name = "graphwire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "graphwire.toml")]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the name registry service
    Registry {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "9400")]
        port: u16,
    },

    /// Publish a graph; mutations are read from stdin as JSON lines
    Publish {
        /// Locator of the form //registry-host:port/name
        locator: String,

        /// Id the published graph stamps its events with
        #[arg(short, long, default_value = "publisher")]
        graph_id: String,
    },

    /// Mirror a published graph locally
    Mirror {
        /// Locator of the form //registry-host:port/name
        locator: String,

        /// Address the mirror listens on for producer connections
        #[arg(short, long, default_value = "127.0.0.1:0")]
        listen: String,

        /// Pump interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GraphwireError> {
    let config = crate::config::AppConfig::load(&cli.config)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Registry { host, port } => cmd_registry(&host, port).await,
        Commands::Publish { locator, graph_id } => {
            cmd_publish(&locator, config.registry.as_deref(), &graph_id).await
        }
        Commands::Mirror {
            locator,
            listen,
            interval_ms,
        } => {
            let interval = interval_ms.or(config.pump_interval_ms).unwrap_or(25);
            cmd_mirror(
                &locator,
                config.registry.as_deref(),
                &listen,
                interval,
                config.pipe_capacity,
                json_mode,
            )
            .await
        }
    }
}
