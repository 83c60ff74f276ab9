//! # Time Guard
//!
//! Per-source sequence-number deduplication. A guard sits in front of a
//! sink (every graph owns one) and drops events whose stamp does not
//! strictly advance the last accepted time for their origin. This is the
//! mechanism that makes replay idempotent and keeps bidirectionally
//! mirrored graphs loop-free: an echoed event carries its original stamp,
//! which the originating graph has already recorded.

use crate::config::ReplicationConfig;
use crate::types::SourceId;
use std::collections::BTreeMap;

// =============================================================================
// TIME GUARD
// =============================================================================

/// Tracks the last accepted sequence number per originating source.
#[derive(Debug, Clone, Default)]
pub struct TimeGuard {
    /// When false, `accept` always returns true and keeps no table.
    enabled: bool,
    /// Lazily populated: origin -> last accepted time.
    last_seen: BTreeMap<SourceId, u64>,
    /// Stale/duplicate events dropped so far. Drops are not errors.
    dropped: u64,
}

impl TimeGuard {
    /// Create a guard with deduplication on or off.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_seen: BTreeMap::new(),
            dropped: 0,
        }
    }

    /// Create a guard from a replication config.
    #[must_use]
    pub fn from_config(config: &ReplicationConfig) -> Self {
        Self::new(config.dedup)
    }

    /// Decide whether an event stamped `(origin, time)` is new.
    ///
    /// Returns true and records the time if the origin is unseen or `time`
    /// strictly advances the stored value; otherwise returns false and
    /// counts a drop. A disabled guard accepts everything.
    pub fn accept(&mut self, origin: &SourceId, time: u64) -> bool {
        if !self.enabled {
            return true;
        }

        match self.last_seen.get_mut(origin) {
            None => {
                self.last_seen.insert(origin.clone(), time);
                true
            }
            Some(last) if time > *last => {
                *last = time;
                true
            }
            Some(_) => {
                self.dropped = self.dropped.saturating_add(1);
                false
            }
        }
    }

    /// Number of events dropped as stale or duplicate.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Last accepted time for an origin, if any was recorded.
    #[must_use]
    pub fn last_seen(&self, origin: &SourceId) -> Option<u64> {
        self.last_seen.get(origin).copied()
    }

    /// Forget every recorded origin. The drop counter is kept.
    pub fn reset(&mut self) {
        self.last_seen.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
