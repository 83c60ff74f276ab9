//! # Attribute Container
//!
//! Per-element key/value store shared by nodes, edges, and the graph
//! itself. The container is a plain ordered map; the owning graph drives
//! event emission and the null-value policy around it, so the same type
//! serves all three element kinds without carrying a back-reference.

use crate::types::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ATTRIBUTE SET
// =============================================================================

/// Mapping from attribute name to value, deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    values: BTreeMap<String, AttrValue>,
}

impl AttributeSet {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) -> Option<AttrValue> {
        self.values.insert(key.into(), value)
    }

    /// Remove a key, returning the removed value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.values.remove(key)
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Enumerate keys in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Enumerate entries in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop all attributes.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
