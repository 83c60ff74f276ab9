//! # Core Type Definitions
//!
//! This module contains the identity and value types shared by the whole
//! workspace:
//! - Stream identifiers (`SourceId`)
//! - Element addressing (`ElementKind`, `ElementRef`)
//! - Attribute values (`AttrValue`, a closed tagged union)
//! - Error types (`GraphwireError`)
//!
//! ## Determinism Guarantees
//!
//! All key types implement `Ord` so they can live in `BTreeMap`/`BTreeSet`
//! with deterministic iteration order. `AttrValue` carries `f64` payloads
//! and is therefore only `PartialEq`; it is never used as a map key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// STREAM IDENTIFIERS
// =============================================================================

/// Identifier of the logical origin of an event stream.
///
/// Every graph owns one; replicated events keep the id of the graph that
/// first emitted them, which is what lets the time guard recognize echoes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    /// Create a new source id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Derive a related id, used for snapshot-replay streams.
    #[must_use]
    pub fn derived(&self, suffix: &str, n: u64) -> Self {
        Self(format!("{}-{}-{}", self.0, suffix, n))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ELEMENT ADDRESSING
// =============================================================================

/// The three kinds of attribute-bearing elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Node,
    Edge,
    Graph,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Edge => f.write_str("edge"),
            Self::Graph => f.write_str("graph"),
        }
    }
}

/// Reference to an element inside a graph.
///
/// Node and edge ids live in separate namespaces, so the kind is part of
/// the address. For `ElementKind::Graph` the id is the graph's source id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: String,
}

impl ElementRef {
    /// Reference a node by id.
    #[must_use]
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Node,
            id: id.into(),
        }
    }

    /// Reference an edge by id.
    #[must_use]
    pub fn edge(id: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Edge,
            id: id.into(),
        }
    }

    /// Reference the graph itself.
    #[must_use]
    pub fn graph() -> Self {
        Self {
            kind: ElementKind::Graph,
            id: String::new(),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

// =============================================================================
// ATTRIBUTE VALUES
// =============================================================================

/// Attribute value: a closed tagged union.
///
/// Keeping the set of variants closed makes the remote marshaling contract
/// total — every value a graph can hold round-trips the wire byte-exactly.
/// Nested numeric structures like `[[1.0, 1.0], [2.0, 2.0]]` are expressed
/// as `List` of `List` of `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
    Bytes(Vec<u8>),
}

impl AttrValue {
    /// Build a `List` of `Float` rows from a nested numeric slice.
    #[must_use]
    pub fn points(rows: &[&[f64]]) -> Self {
        Self::List(
            rows.iter()
                .map(|row| Self::List(row.iter().map(|v| Self::Float(*v)).collect()))
                .collect(),
        )
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Graphwire system.
///
/// Structural errors (`DuplicateId`, `UnknownEndpoint`, `NoSuchElement`,
/// `InvalidAttribute`) are synchronous failures of the mutating call and
/// leave the graph unchanged. Dispatch-time errors (`Dispatch`,
/// `Serialization`, `RemoteDelivery`) are isolated per sink and reported
/// through the owning sink set's error hook.
#[derive(Debug, Error)]
pub enum GraphwireError {
    /// An element with this id already exists.
    #[error("duplicate identifier: {0}")]
    DuplicateId(String),

    /// An edge referenced a node that is not in the graph.
    #[error("unknown endpoint '{endpoint}' for edge '{edge}'")]
    UnknownEndpoint { edge: String, endpoint: String },

    /// The addressed element does not exist.
    #[error("no such element: {0}")]
    NoSuchElement(ElementRef),

    /// Null attribute values are configured to be errors on this graph.
    #[error("invalid attribute '{key}' on {element}: null values are errors")]
    InvalidAttribute { element: ElementRef, key: String },

    /// An event or attribute value could not be marshaled.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A remote sink could not be reached or refused delivery.
    #[error("remote delivery failed: {0}")]
    RemoteDelivery(String),

    /// A registry name is already taken.
    #[error("name already bound: {0}")]
    NameAlreadyBound(String),

    /// A sink failed while handling an event.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// An I/O error occurred on the transport.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_derivation_is_stable() {
        let id = SourceId::new("g1");
        assert_eq!(id.derived("replay", 0).as_str(), "g1-replay-0");
        assert_eq!(id.derived("replay", 1).as_str(), "g1-replay-1");
    }

    #[test]
    fn points_builds_nested_lists() {
        let points = AttrValue::points(&[&[1.0, 1.0], &[2.0, 2.0]]);
        let expected = AttrValue::List(vec![
            AttrValue::List(vec![AttrValue::Float(1.0), AttrValue::Float(1.0)]),
            AttrValue::List(vec![AttrValue::Float(2.0), AttrValue::Float(2.0)]),
        ]);
        assert_eq!(points, expected);
    }

    #[test]
    fn element_ref_display_names_kind() {
        assert_eq!(ElementRef::node("A").to_string(), "node 'A'");
        assert_eq!(ElementRef::edge("AB").to_string(), "edge 'AB'");
    }

    #[test]
    fn attr_value_from_conversions() {
        assert_eq!(AttrValue::from(1i64), AttrValue::Int(1));
        assert_eq!(AttrValue::from(true), AttrValue::Bool(true));
        assert_eq!(AttrValue::from("test"), AttrValue::Text("test".to_string()));
    }
}
