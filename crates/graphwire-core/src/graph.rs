//! # Graph Store
//!
//! The adjacency-model graph store. Every successful mutation emits exactly
//! one corresponding event to all registered sinks, synchronously and in
//! registration order, before the mutating call returns.
//!
//! A `Graph` is also a [`Sink`]: feeding it another graph's event stream
//! mirrors that graph. Incoming events pass the graph's own [`TimeGuard`]
//! and, when accepted, are applied and re-emitted downstream with their
//! ORIGINAL stamp — never re-stamped — so echoes die at the guard of the
//! graph that first emitted them.
//!
//! Each `Graph` instance is meant to be mutated by a single logical owner
//! at a time. There is no internal locking around adjacency; the boundary
//! pipe is the only structure designed for concurrent access.

use crate::attributes::AttributeSet;
use crate::config::ReplicationConfig;
use crate::event::{Event, StampedEvent};
use crate::sink::{Sink, SinkHandle};
use crate::source::{ErrorHook, SinkSet, Source};
use crate::sync::TimeGuard;
use crate::types::{AttrValue, ElementKind, ElementRef, GraphwireError, SourceId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// ELEMENTS
// =============================================================================

/// A node: identity, compaction-sensitive index, attributes, adjacency.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    index: usize,
    attributes: AttributeSet,
    /// Incident edge ids, insertion order. A self-loop appears once.
    incident: Vec<String>,
    in_degree: usize,
    out_degree: usize,
}

impl Node {
    fn new(id: &str, index: usize) -> Self {
        Self {
            id: id.to_string(),
            index,
            attributes: AttributeSet::new(),
            incident: Vec::new(),
            in_degree: 0,
            out_degree: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Integer index, stable only until a removal compacts the table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Number of incident edges. O(1).
    #[must_use]
    pub fn degree(&self) -> usize {
        self.incident.len()
    }

    /// Edges entering this node (undirected edges count). O(1).
    #[must_use]
    pub fn in_degree(&self) -> usize {
        self.in_degree
    }

    /// Edges leaving this node (undirected edges count). O(1).
    #[must_use]
    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    /// Incident edge ids in insertion order.
    pub fn incident_edges(&self) -> impl Iterator<Item = &str> {
        self.incident.iter().map(String::as_str)
    }
}

/// An edge: identity, index, two endpoints, directedness, attributes.
#[derive(Debug, Clone)]
pub struct Edge {
    id: String,
    index: usize,
    from: String,
    to: String,
    directed: bool,
    attributes: AttributeSet,
}

impl Edge {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Integer index, stable only until a removal compacts the table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// First endpoint (the source, for a directed edge).
    #[must_use]
    pub fn node0(&self) -> &str {
        &self.from
    }

    /// Second endpoint (the target, for a directed edge).
    #[must_use]
    pub fn node1(&self) -> &str {
        &self.to
    }

    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint at all.
    #[must_use]
    pub fn opposite(&self, node: &str) -> Option<&str> {
        if self.from == node {
            Some(&self.to)
        } else if self.to == node {
            Some(&self.from)
        } else {
            None
        }
    }

    fn touches(&self, node: &str) -> bool {
        self.from == node || self.to == node
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// The event-emitting graph store.
pub struct Graph {
    id: SourceId,
    config: ReplicationConfig,
    /// Local sequence clock; each local mutation advances it by one.
    clock: u64,
    /// Dedup guard for replicated events. Local emissions register here
    /// too, so echoes of this graph's own events are recognized.
    guard: TimeGuard,
    nodes: BTreeMap<String, Node>,
    /// Node ids by index; swap-remove on deletion.
    node_order: Vec<String>,
    edges: BTreeMap<String, Edge>,
    edge_order: Vec<String>,
    attributes: AttributeSet,
    sinks: SinkSet,
    /// Snapshot replays performed so far; feeds replay source ids.
    replays: u64,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl Graph {
    /// Create an empty graph with the default replication config.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_config(id, ReplicationConfig::default())
    }

    /// Create an empty graph with an explicit replication config.
    #[must_use]
    pub fn with_config(id: impl Into<String>, config: ReplicationConfig) -> Self {
        let guard = TimeGuard::from_config(&config);
        Self {
            id: SourceId::new(id),
            config,
            clock: 0,
            guard,
            nodes: BTreeMap::new(),
            node_order: Vec::new(),
            edges: BTreeMap::new(),
            edge_order: Vec::new(),
            attributes: AttributeSet::new(),
            sinks: SinkSet::new(),
            replays: 0,
        }
    }

    /// This graph's source id.
    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Replace the dispatch error hook.
    pub fn set_error_hook(&mut self, hook: ErrorHook) {
        self.sinks.set_error_hook(hook);
    }

    /// Stale/duplicate replicated events dropped by this graph's guard.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.guard.dropped()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Edges in index order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    /// Degree of a node. O(1).
    #[must_use]
    pub fn degree(&self, node: &str) -> Option<usize> {
        self.nodes.get(node).map(Node::degree)
    }

    /// Incoming degree of a node (undirected edges count). O(1).
    #[must_use]
    pub fn in_degree(&self, node: &str) -> Option<usize> {
        self.nodes.get(node).map(Node::in_degree)
    }

    /// Outgoing degree of a node (undirected edges count). O(1).
    #[must_use]
    pub fn out_degree(&self, node: &str) -> Option<usize> {
        self.nodes.get(node).map(Node::out_degree)
    }

    /// Attribute keys of an element, in key order.
    pub fn attribute_keys(&self, element: &ElementRef) -> Result<Vec<String>, GraphwireError> {
        Ok(self
            .attribute_set(element)?
            .keys()
            .map(str::to_string)
            .collect())
    }

    /// Some edge connecting `a` and `b`, in either direction. O(degree).
    #[must_use]
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        let node = self.nodes.get(a)?;
        node.incident
            .iter()
            .filter_map(|eid| self.edges.get(eid))
            .find(|edge| edge.touches(b))
    }

    /// Distinct neighbor ids of a node, each visited once even when
    /// parallel edges exist. O(degree).
    #[must_use]
    pub fn neighbors(&self, node: &str) -> Vec<String> {
        let Some(n) = self.nodes.get(node) else {
            return Vec::new();
        };
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for eid in &n.incident {
            if let Some(edge) = self.edges.get(eid) {
                if let Some(other) = edge.opposite(node) {
                    seen.insert(other);
                }
            }
        }
        seen.into_iter().map(str::to_string).collect()
    }

    /// Attribute container of an element.
    pub fn attribute_set(&self, element: &ElementRef) -> Result<&AttributeSet, GraphwireError> {
        match element.kind {
            ElementKind::Graph => Ok(&self.attributes),
            ElementKind::Node => self
                .nodes
                .get(&element.id)
                .map(|n| &n.attributes)
                .ok_or_else(|| GraphwireError::NoSuchElement(element.clone())),
            ElementKind::Edge => self
                .edges
                .get(&element.id)
                .map(|e| &e.attributes)
                .ok_or_else(|| GraphwireError::NoSuchElement(element.clone())),
        }
    }

    #[must_use]
    pub fn node_attribute(&self, node: &str, key: &str) -> Option<&AttrValue> {
        self.nodes.get(node).and_then(|n| n.attributes.get(key))
    }

    #[must_use]
    pub fn edge_attribute(&self, edge: &str, key: &str) -> Option<&AttrValue> {
        self.edges.get(edge).and_then(|e| e.attributes.get(key))
    }

    #[must_use]
    pub fn graph_attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Add a node. Fails with `DuplicateId` if the id exists; the event
    /// reaches every sink before this call returns.
    pub fn add_node(&mut self, id: impl Into<String>) -> Result<(), GraphwireError> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(GraphwireError::DuplicateId(id));
        }
        self.insert_node(&id);
        let (origin, time) = self.stamp();
        self.sinks
            .dispatch(&StampedEvent::new(origin, time, Event::NodeAdded { id }));
        Ok(())
    }

    /// Add an edge between two existing nodes. No implicit node creation.
    pub fn add_edge(
        &mut self,
        id: impl Into<String>,
        from: &str,
        to: &str,
        directed: bool,
    ) -> Result<(), GraphwireError> {
        let id = id.into();
        self.insert_edge(&id, from, to, directed)?;
        let (origin, time) = self.stamp();
        self.sinks.dispatch(&StampedEvent::new(
            origin,
            time,
            Event::EdgeAdded {
                id,
                from: from.to_string(),
                to: to.to_string(),
                directed,
            },
        ));
        Ok(())
    }

    /// Remove an edge by id.
    pub fn remove_edge(&mut self, id: &str) -> Result<(), GraphwireError> {
        if !self.edges.contains_key(id) {
            return Err(GraphwireError::NoSuchElement(ElementRef::edge(id)));
        }
        self.remove_edge_emitting(id);
        Ok(())
    }

    /// Remove some edge connecting `a` and `b`.
    pub fn remove_edge_between(&mut self, a: &str, b: &str) -> Result<(), GraphwireError> {
        let id = self
            .edge_between(a, b)
            .map(|e| e.id.clone())
            .ok_or_else(|| GraphwireError::NoSuchElement(ElementRef::edge(format!("{a}--{b}"))))?;
        self.remove_edge_emitting(&id);
        Ok(())
    }

    /// Remove a node. All incident edges are removed first, each with its
    /// own event, strictly before the node's own removal event.
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphwireError> {
        let incident: Vec<String> = match self.nodes.get(id) {
            Some(node) => node.incident.clone(),
            None => return Err(GraphwireError::NoSuchElement(ElementRef::node(id))),
        };
        for eid in incident {
            self.remove_edge_emitting(&eid);
        }
        self.detach_node(id);
        let (origin, time) = self.stamp();
        self.sinks.dispatch(&StampedEvent::new(
            origin,
            time,
            Event::NodeRemoved { id: id.to_string() },
        ));
        Ok(())
    }

    /// Set or remove an attribute on an element.
    ///
    /// `None` means removal, unless the graph was configured with
    /// `strict_null_attributes`, in which case it fails with
    /// `InvalidAttribute` and nothing changes.
    pub fn set_attribute(
        &mut self,
        element: &ElementRef,
        key: &str,
        value: Option<AttrValue>,
    ) -> Result<(), GraphwireError> {
        if value.is_none() && self.config.strict_null_attributes {
            return Err(GraphwireError::InvalidAttribute {
                element: element.clone(),
                key: key.to_string(),
            });
        }
        self.write_attribute(element, key, value)
    }

    /// Remove an attribute. No event (and no error) if the key is absent.
    /// Explicit removal is always legal, regardless of the null policy.
    pub fn remove_attribute(
        &mut self,
        element: &ElementRef,
        key: &str,
    ) -> Result<(), GraphwireError> {
        self.write_attribute(element, key, None)
    }

    /// Remove all edges, then all nodes, then the graph's own attributes,
    /// each step emitting its events, then emit `GraphCleared`.
    pub fn clear(&mut self) {
        let edge_ids = self.edge_order.clone();
        for id in edge_ids {
            self.remove_edge_emitting(&id);
        }

        let node_ids = self.node_order.clone();
        for id in node_ids {
            self.detach_node(&id);
            let (origin, time) = self.stamp();
            self.sinks
                .dispatch(&StampedEvent::new(origin, time, Event::NodeRemoved { id }));
        }

        let keys: Vec<String> = self.attributes.keys().map(str::to_string).collect();
        for key in keys {
            // Never fails for the graph element.
            let _ = self.write_attribute(&ElementRef::graph(), &key, None);
        }

        let (origin, time) = self.stamp();
        self.sinks
            .dispatch(&StampedEvent::new(origin, time, Event::GraphCleared));
    }

    /// Announce the beginning of a logical step in the graph's evolution.
    pub fn step_begins(&mut self, step: f64) {
        let (origin, time) = self.stamp();
        self.sinks
            .dispatch(&StampedEvent::new(origin, time, Event::StepBegun { step }));
    }

    // -------------------------------------------------------------------------
    // Snapshot replay
    // -------------------------------------------------------------------------

    /// Feed the graph's current state into a sink as synthesized events:
    /// nodes with their attributes, then edges with theirs, then graph
    /// attributes. The stream uses a derived replay source id with a fresh
    /// clock so downstream guards accept it once and only once.
    pub fn replay_into(&mut self, sink: &mut dyn Sink) -> Result<(), GraphwireError> {
        let origin = self.id.derived("replay", self.replays);
        self.replays = self.replays.saturating_add(1);
        let mut time = 0u64;

        for node_id in &self.node_order {
            let Some(node) = self.nodes.get(node_id) else {
                continue;
            };
            time = time.saturating_add(1);
            sink.node_added(&origin, time, &node.id)?;
            let element = ElementRef::node(&node.id);
            for (key, value) in node.attributes.iter() {
                time = time.saturating_add(1);
                sink.attribute_changed(&origin, time, &element, key, None, Some(value))?;
            }
        }

        for edge_id in &self.edge_order {
            let Some(edge) = self.edges.get(edge_id) else {
                continue;
            };
            time = time.saturating_add(1);
            sink.edge_added(&origin, time, &edge.id, &edge.from, &edge.to, edge.directed)?;
            let element = ElementRef::edge(&edge.id);
            for (key, value) in edge.attributes.iter() {
                time = time.saturating_add(1);
                sink.attribute_changed(&origin, time, &element, key, None, Some(value))?;
            }
        }

        let element = ElementRef::graph();
        for (key, value) in self.attributes.iter() {
            time = time.saturating_add(1);
            sink.attribute_changed(&origin, time, &element, key, None, Some(value))?;
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Advance the local clock and register the emission with the guard,
    /// so echoes of this event are dropped when they come back.
    fn stamp(&mut self) -> (SourceId, u64) {
        self.clock = self.clock.saturating_add(1);
        let time = self.clock;
        self.guard.accept(&self.id, time);
        (self.id.clone(), time)
    }

    fn insert_node(&mut self, id: &str) {
        let index = self.node_order.len();
        self.node_order.push(id.to_string());
        self.nodes.insert(id.to_string(), Node::new(id, index));
    }

    fn insert_edge(
        &mut self,
        id: &str,
        from: &str,
        to: &str,
        directed: bool,
    ) -> Result<(), GraphwireError> {
        if self.edges.contains_key(id) {
            return Err(GraphwireError::DuplicateId(id.to_string()));
        }
        if !self.nodes.contains_key(from) {
            return Err(GraphwireError::UnknownEndpoint {
                edge: id.to_string(),
                endpoint: from.to_string(),
            });
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphwireError::UnknownEndpoint {
                edge: id.to_string(),
                endpoint: to.to_string(),
            });
        }

        let index = self.edge_order.len();
        self.edge_order.push(id.to_string());
        self.edges.insert(
            id.to_string(),
            Edge {
                id: id.to_string(),
                index,
                from: from.to_string(),
                to: to.to_string(),
                directed,
                attributes: AttributeSet::new(),
            },
        );

        if from == to {
            if let Some(node) = self.nodes.get_mut(from) {
                node.incident.push(id.to_string());
                node.in_degree = node.in_degree.saturating_add(1);
                node.out_degree = node.out_degree.saturating_add(1);
            }
        } else {
            if let Some(node) = self.nodes.get_mut(from) {
                node.incident.push(id.to_string());
                node.out_degree = node.out_degree.saturating_add(1);
                if !directed {
                    node.in_degree = node.in_degree.saturating_add(1);
                }
            }
            if let Some(node) = self.nodes.get_mut(to) {
                node.incident.push(id.to_string());
                node.in_degree = node.in_degree.saturating_add(1);
                if !directed {
                    node.out_degree = node.out_degree.saturating_add(1);
                }
            }
        }
        Ok(())
    }

    fn remove_edge_emitting(&mut self, id: &str) {
        if self.detach_edge(id) {
            let (origin, time) = self.stamp();
            self.sinks.dispatch(&StampedEvent::new(
                origin,
                time,
                Event::EdgeRemoved { id: id.to_string() },
            ));
        }
    }

    /// Remove the edge from storage, adjacency, and the index table.
    /// Returns false if the edge was absent.
    fn detach_edge(&mut self, id: &str) -> bool {
        let Some(edge) = self.edges.remove(id) else {
            return false;
        };

        // Swap-remove from the index table; the moved edge inherits the slot.
        let slot = edge.index;
        self.edge_order.swap_remove(slot);
        if let Some(moved_id) = self.edge_order.get(slot).cloned() {
            if let Some(moved) = self.edges.get_mut(&moved_id) {
                moved.index = slot;
            }
        }

        if edge.from == edge.to {
            if let Some(node) = self.nodes.get_mut(&edge.from) {
                node.incident.retain(|eid| eid != id);
                node.in_degree = node.in_degree.saturating_sub(1);
                node.out_degree = node.out_degree.saturating_sub(1);
            }
        } else {
            if let Some(node) = self.nodes.get_mut(&edge.from) {
                node.incident.retain(|eid| eid != id);
                node.out_degree = node.out_degree.saturating_sub(1);
                if !edge.directed {
                    node.in_degree = node.in_degree.saturating_sub(1);
                }
            }
            if let Some(node) = self.nodes.get_mut(&edge.to) {
                node.incident.retain(|eid| eid != id);
                node.in_degree = node.in_degree.saturating_sub(1);
                if !edge.directed {
                    node.out_degree = node.out_degree.saturating_sub(1);
                }
            }
        }
        true
    }

    /// Remove the node from storage and the index table. The caller is
    /// responsible for having removed incident edges first.
    fn detach_node(&mut self, id: &str) {
        let Some(node) = self.nodes.remove(id) else {
            return;
        };
        let slot = node.index;
        self.node_order.swap_remove(slot);
        if let Some(moved_id) = self.node_order.get(slot).cloned() {
            if let Some(moved) = self.nodes.get_mut(&moved_id) {
                moved.index = slot;
            }
        }
    }

    fn attribute_set_mut(
        &mut self,
        element: &ElementRef,
    ) -> Result<&mut AttributeSet, GraphwireError> {
        match element.kind {
            ElementKind::Graph => Ok(&mut self.attributes),
            ElementKind::Node => self
                .nodes
                .get_mut(&element.id)
                .map(|n| &mut n.attributes)
                .ok_or_else(|| GraphwireError::NoSuchElement(element.clone())),
            ElementKind::Edge => self
                .edges
                .get_mut(&element.id)
                .map(|e| &mut e.attributes)
                .ok_or_else(|| GraphwireError::NoSuchElement(element.clone())),
        }
    }

    fn write_attribute(
        &mut self,
        element: &ElementRef,
        key: &str,
        value: Option<AttrValue>,
    ) -> Result<(), GraphwireError> {
        let attrs = self.attribute_set_mut(element)?;
        let old = match &value {
            Some(v) => attrs.set(key, v.clone()),
            None => {
                let old = attrs.remove(key);
                if old.is_none() {
                    // Removing an absent key is a silent no-op.
                    return Ok(());
                }
                old
            }
        };
        let (origin, time) = self.stamp();
        self.sinks.dispatch(&StampedEvent::new(
            origin,
            time,
            Event::AttributeChanged {
                element: element.clone(),
                key: key.to_string(),
                old,
                new: value,
            },
        ));
        Ok(())
    }

    /// Drop all state without emitting anything. Used when applying a
    /// replicated `GraphCleared`, whose upstream already streamed the
    /// individual removals.
    fn clear_silent(&mut self) {
        self.edges.clear();
        self.edge_order.clear();
        self.nodes.clear();
        self.node_order.clear();
        self.attributes.clear();
    }

    /// Re-emit a replicated event downstream, preserving its stamp.
    fn forward(&mut self, origin: &SourceId, time: u64, event: Event) {
        self.sinks
            .dispatch(&StampedEvent::new(origin.clone(), time, event));
    }
}

// =============================================================================
// SOURCE IMPLEMENTATION
// =============================================================================

impl Source for Graph {
    fn add_sink(&mut self, sink: SinkHandle) -> bool {
        self.sinks.add_sink(sink)
    }

    fn add_element_sink(&mut self, sink: SinkHandle) -> bool {
        self.sinks.add_element_sink(sink)
    }

    fn add_attribute_sink(&mut self, sink: SinkHandle) -> bool {
        self.sinks.add_attribute_sink(sink)
    }

    fn remove_sink(&mut self, sink: &SinkHandle) -> bool {
        self.sinks.remove_sink(sink)
    }
}

// =============================================================================
// SINK IMPLEMENTATION (replication)
// =============================================================================

impl Sink for Graph {
    fn node_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        if self.nodes.contains_key(id) {
            return Err(GraphwireError::DuplicateId(id.to_string()));
        }
        self.insert_node(id);
        self.forward(origin, time, Event::NodeAdded { id: id.to_string() });
        Ok(())
    }

    fn node_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        if !self.nodes.contains_key(id) {
            return Err(GraphwireError::NoSuchElement(ElementRef::node(id)));
        }
        // Upstream streamed the incident-edge removals before this event;
        // anything still attached is detached silently to converge.
        let incident: Vec<String> = self
            .nodes
            .get(id)
            .map(|n| n.incident.clone())
            .unwrap_or_default();
        for eid in incident {
            self.detach_edge(&eid);
        }
        self.detach_node(id);
        self.forward(origin, time, Event::NodeRemoved { id: id.to_string() });
        Ok(())
    }

    fn edge_added(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
        from: &str,
        to: &str,
        directed: bool,
    ) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        self.insert_edge(id, from, to, directed)?;
        self.forward(
            origin,
            time,
            Event::EdgeAdded {
                id: id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                directed,
            },
        );
        Ok(())
    }

    fn edge_removed(
        &mut self,
        origin: &SourceId,
        time: u64,
        id: &str,
    ) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        if !self.detach_edge(id) {
            return Err(GraphwireError::NoSuchElement(ElementRef::edge(id)));
        }
        self.forward(origin, time, Event::EdgeRemoved { id: id.to_string() });
        Ok(())
    }

    fn attribute_changed(
        &mut self,
        origin: &SourceId,
        time: u64,
        element: &ElementRef,
        key: &str,
        old: Option<&AttrValue>,
        new: Option<&AttrValue>,
    ) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        let attrs = self.attribute_set_mut(element)?;
        match new {
            Some(v) => {
                attrs.set(key, v.clone());
            }
            None => {
                attrs.remove(key);
            }
        }
        self.forward(
            origin,
            time,
            Event::AttributeChanged {
                element: element.clone(),
                key: key.to_string(),
                old: old.cloned(),
                new: new.cloned(),
            },
        );
        Ok(())
    }

    fn graph_cleared(&mut self, origin: &SourceId, time: u64) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        self.clear_silent();
        self.forward(origin, time, Event::GraphCleared);
        Ok(())
    }

    fn step_begun(
        &mut self,
        origin: &SourceId,
        time: u64,
        step: f64,
    ) -> Result<(), GraphwireError> {
        if !self.guard.accept(origin, time) {
            return Ok(());
        }
        self.forward(origin, time, Event::StepBegun { step });
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
