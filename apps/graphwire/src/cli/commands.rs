//! # CLI Command Implementations
//!
//! The `publish` feed format is one JSON object per stdin line:
//!
//! ```text
//! {"op":"add-node","id":"A"}
//! {"op":"add-edge","id":"AB","from":"A","to":"B","directed":false}
//! {"op":"set-attr","target":"node","id":"A","key":"int","value":1}
//! {"op":"remove-attr","target":"graph","key":"stale"}
//! {"op":"remove-edge","id":"AB"}
//! {"op":"remove-node","id":"A"}
//! {"op":"step","step":1.0}
//! {"op":"clear"}
//! ```

use graphwire_core::{
    AttrValue, ElementRef, Graph, GraphwireError, PipeCapacity, ReplicationConfig, Source,
    sink_handle,
};
use graphwire_net::registry::{Registry, parse_locator};
use graphwire_net::remote::{RemoteSink, RemoteSource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

// =============================================================================
// MUTATION FEED
// =============================================================================

/// One line of the publish feed.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
enum Mutation {
    AddNode {
        id: String,
    },
    RemoveNode {
        id: String,
    },
    AddEdge {
        id: String,
        from: String,
        to: String,
        #[serde(default)]
        directed: bool,
    },
    RemoveEdge {
        id: String,
    },
    SetAttr {
        target: Target,
        #[serde(default)]
        id: String,
        key: String,
        value: serde_json::Value,
    },
    RemoveAttr {
        target: Target,
        #[serde(default)]
        id: String,
        key: String,
    },
    Clear,
    Step {
        step: f64,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Target {
    Graph,
    Node,
    Edge,
}

fn element_ref(target: Target, id: &str) -> ElementRef {
    match target {
        Target::Graph => ElementRef::graph(),
        Target::Node => ElementRef::node(id),
        Target::Edge => ElementRef::edge(id),
    }
}

/// Convert a JSON value into an attribute value. `null` maps to `None`,
/// which the graph treats as removal.
fn attr_from_json(value: &serde_json::Value) -> Option<AttrValue> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(AttrValue::Bool(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(AttrValue::Int)
            .or_else(|| n.as_f64().map(AttrValue::Float)),
        serde_json::Value::String(s) => Some(AttrValue::Text(s.clone())),
        serde_json::Value::Array(items) => Some(AttrValue::List(
            items.iter().filter_map(attr_from_json).collect(),
        )),
        serde_json::Value::Object(fields) => {
            let map: BTreeMap<String, AttrValue> = fields
                .iter()
                .filter_map(|(k, v)| attr_from_json(v).map(|av| (k.clone(), av)))
                .collect();
            Some(AttrValue::Map(map))
        }
    }
}

fn apply_mutation(graph: &mut Graph, mutation: Mutation) -> Result<(), GraphwireError> {
    match mutation {
        Mutation::AddNode { id } => graph.add_node(id),
        Mutation::RemoveNode { id } => graph.remove_node(&id),
        Mutation::AddEdge {
            id,
            from,
            to,
            directed,
        } => graph.add_edge(id, &from, &to, directed),
        Mutation::RemoveEdge { id } => graph.remove_edge(&id),
        Mutation::SetAttr {
            target,
            id,
            key,
            value,
        } => graph.set_attribute(&element_ref(target, &id), &key, attr_from_json(&value)),
        Mutation::RemoveAttr { target, id, key } => {
            graph.remove_attribute(&element_ref(target, &id), &key)
        }
        Mutation::Clear => {
            graph.clear();
            Ok(())
        }
        Mutation::Step { step } => {
            graph.step_begins(step);
            Ok(())
        }
    }
}

// =============================================================================
// ADDRESS RESOLUTION
// =============================================================================

/// Split a locator into registry authority and name.
///
/// A full `//host:port/name` locator is self-contained; a bare `name`
/// falls back to the `registry` entry of the config file.
fn split_locator(
    locator: &str,
    default_registry: Option<&str>,
) -> Result<(String, String), GraphwireError> {
    if locator.starts_with("//") {
        return parse_locator(locator);
    }
    match default_registry {
        Some(registry) => Ok((registry.to_string(), locator.to_string())),
        None => Err(GraphwireError::RemoteDelivery(format!(
            "bare name '{locator}' needs a 'registry' entry in the config file"
        ))),
    }
}

async fn resolve(authority: &str) -> Result<SocketAddr, GraphwireError> {
    tokio::net::lookup_host(authority)
        .await
        .map_err(|e| GraphwireError::Io(format!("cannot resolve '{authority}': {e}")))?
        .next()
        .ok_or_else(|| GraphwireError::Io(format!("'{authority}' resolved to no address")))
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Run the name registry until interrupted.
pub async fn cmd_registry(host: &str, port: u16) -> Result<(), GraphwireError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| GraphwireError::Io(format!("cannot bind {host}:{port}: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| GraphwireError::Io(e.to_string()))?;
    tracing::info!(%addr, "registry listening");

    let registry = Registry::new();
    tokio::select! {
        result = registry.serve(listener) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}

/// Publish a graph under a registry name; mutations come from stdin.
pub async fn cmd_publish(
    locator: &str,
    default_registry: Option<&str>,
    graph_id: &str,
) -> Result<(), GraphwireError> {
    let (authority, name) = split_locator(locator, default_registry)?;
    let registry = resolve(&authority).await?;

    let remote = RemoteSink::connect(registry, &name).await?;
    tracing::info!(name, peer = %remote.peer(), "publishing");

    let mut graph = Graph::with_config(graph_id, ReplicationConfig::from_env());
    graph.add_sink(sink_handle(remote));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut applied = 0u64;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| GraphwireError::Io(e.to_string()))?;
                let Some(line) = line else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Mutation>(trimmed) {
                    Ok(mutation) => match apply_mutation(&mut graph, mutation) {
                        Ok(()) => applied += 1,
                        Err(err) => tracing::warn!(error = %err, "mutation rejected"),
                    },
                    Err(err) => tracing::warn!(error = %err, "unparseable feed line"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!(
        applied,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "feed finished"
    );
    Ok(())
}

/// Mirror a published graph locally, pumping on an interval.
pub async fn cmd_mirror(
    locator: &str,
    default_registry: Option<&str>,
    listen: &str,
    interval_ms: u64,
    pipe_capacity: Option<usize>,
    json_mode: bool,
) -> Result<(), GraphwireError> {
    let (authority, name) = split_locator(locator, default_registry)?;
    let registry = resolve(&authority).await?;
    let listen = resolve(listen).await?;

    let capacity = match pipe_capacity {
        Some(bound) => PipeCapacity::Bounded(bound),
        None => PipeCapacity::Unbounded,
    };
    let mut source = RemoteSource::bind(registry, &name, listen, capacity).await?;
    tracing::info!(name, endpoint = %source.endpoint(), "mirroring");

    let mut mirror = Graph::with_config(format!("mirror-{name}"), ReplicationConfig::from_env());
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut received = 0usize;
                while source.pump_into(&mut mirror)? {
                    received += 1;
                }
                if received > 0 {
                    tracing::debug!(
                        received,
                        nodes = mirror.node_count(),
                        edges = mirror.edge_count(),
                        "pumped"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if json_mode {
        let summary = serde_json::json!({
            "name": name,
            "nodes": mirror.node_count(),
            "edges": mirror.edge_count(),
            "dropped": mirror.dropped_events(),
        });
        println!("{summary}");
    } else {
        println!(
            "mirror '{name}': {} nodes, {} edges, {} duplicate events dropped",
            mirror.node_count(),
            mirror.edge_count(),
            mirror.dropped_events()
        );
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
