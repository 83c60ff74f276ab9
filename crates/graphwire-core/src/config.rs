//! # Replication Configuration
//!
//! Process-wide flags, resolved once and threaded explicitly into
//! constructors. There is no ambient/static configuration anywhere in the
//! crate: a graph, guard, or pipe only knows what it was handed at
//! construction time.
//!
//! Environment resolution honors a primary key and a deprecated alias for
//! each flag; the primary wins when both are set, and alias use logs a
//! deprecation warning.

use serde::{Deserialize, Serialize};

// =============================================================================
// ENVIRONMENT KEYS
// =============================================================================

/// Primary key disabling time-guard deduplication.
pub const SYNC_DISABLE_KEY: &str = "GRAPHWIRE_SYNC_DISABLE";

/// Deprecated alias for [`SYNC_DISABLE_KEY`].
pub const SYNC_DISABLE_ALIAS: &str = "GRAPHWIRE_NOSYNC";

/// Primary key selecting the default rendering backend. The core never
/// reads the value; it is surfaced for external UI collaborators.
pub const RENDERER_KEY: &str = "GRAPHWIRE_RENDERER";

/// Deprecated alias for [`RENDERER_KEY`].
pub const RENDERER_ALIAS: &str = "GRAPHWIRE_UI_RENDERER";

// =============================================================================
// PIPE CAPACITY
// =============================================================================

/// Queue bound for a boundary pipe.
///
/// An unbounded pipe never loses events but can grow without limit under a
/// slow consumer. A bounded pipe refuses events once full — the overflow is
/// reported through the producing graph's error hook — because `enqueue`
/// must never block a mutation in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipeCapacity {
    Unbounded,
    Bounded(usize),
}

impl Default for PipeCapacity {
    fn default() -> Self {
        Self::Unbounded
    }
}

// =============================================================================
// REPLICATION CONFIG
// =============================================================================

/// Configuration threaded into graphs, guards, and pipes at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Whether time guards deduplicate. Disable only when the embedding
    /// application guarantees no duplicate delivery.
    pub dedup: bool,

    /// Queue bound applied to boundary pipes built from this config.
    pub pipe_capacity: PipeCapacity,

    /// When true, setting an attribute to a null value is an error
    /// instead of being treated as removal.
    pub strict_null_attributes: bool,

    /// Rendering backend hint for external UI collaborators.
    pub renderer: Option<String>,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            dedup: true,
            pipe_capacity: PipeCapacity::Unbounded,
            strict_null_attributes: false,
            renderer: None,
        }
    }
}

impl ReplicationConfig {
    /// Resolve the configuration from the process environment.
    ///
    /// Call once at startup and pass the result around; repeated calls are
    /// harmless but re-log deprecation warnings.
    #[must_use]
    pub fn from_env() -> Self {
        let sync_disable = resolve_flag(SYNC_DISABLE_KEY, SYNC_DISABLE_ALIAS);
        let renderer = resolve_value(RENDERER_KEY, RENDERER_ALIAS);

        Self {
            dedup: sync_disable.is_none(),
            renderer,
            ..Self::default()
        }
    }

    /// Builder-style toggle for strict null attribute handling.
    #[must_use]
    pub fn with_strict_null_attributes(mut self, strict: bool) -> Self {
        self.strict_null_attributes = strict;
        self
    }

    /// Builder-style pipe capacity override.
    #[must_use]
    pub fn with_pipe_capacity(mut self, capacity: PipeCapacity) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    /// Builder-style dedup toggle.
    #[must_use]
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}

/// Resolve a key/alias pair to a value. Primary wins; alias use warns.
fn resolve_value(primary: &str, alias: &str) -> Option<String> {
    if let Ok(value) = std::env::var(primary) {
        if !value.is_empty() {
            return Some(value);
        }
    }
    if let Ok(value) = std::env::var(alias) {
        if !value.is_empty() {
            tracing::warn!(
                alias,
                primary,
                "deprecated configuration key in use; switch to the primary key"
            );
            return Some(value);
        }
    }
    None
}

/// Resolve a key/alias pair treated as a presence flag.
fn resolve_flag(primary: &str, alias: &str) -> Option<String> {
    resolve_value(primary, alias)
}

// =============================================================================
// TESTS
// =============================================================================
