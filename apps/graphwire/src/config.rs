//! # Application Configuration
//!
//! Optional `graphwire.toml` in the working directory. Command-line
//! arguments always win over file values; the file only fills in what the
//! invocation left out.

use graphwire_core::GraphwireError;
use serde::Deserialize;
use std::path::Path;

/// Values loadable from `graphwire.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Default registry authority, e.g. "127.0.0.1:9400".
    pub registry: Option<String>,

    /// Default mirror pump interval in milliseconds.
    pub pump_interval_ms: Option<u64>,

    /// Queue bound for the mirror's receive pipe; absent means unbounded.
    pub pipe_capacity: Option<usize>,
}

impl AppConfig {
    /// Load from a file, or return defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, GraphwireError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GraphwireError::Io(format!("cannot read config '{}': {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            GraphwireError::Serialization(format!(
                "invalid config '{}': {e}",
                path.display()
            ))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("does-not-exist.toml")).expect("load");
        assert!(config.registry.is_none());
        assert!(config.pump_interval_ms.is_none());
        assert!(config.pipe_capacity.is_none());
    }

    #[test]
    fn parses_all_fields() {
        let raw = r#"
            registry = "127.0.0.1:9400"
            pump_interval_ms = 50
            pipe_capacity = 1024
        "#;
        let config: AppConfig = toml::from_str(raw).expect("parse");
        assert_eq!(config.registry.as_deref(), Some("127.0.0.1:9400"));
        assert_eq!(config.pump_interval_ms, Some(50));
        assert_eq!(config.pipe_capacity, Some(1024));
    }
}
