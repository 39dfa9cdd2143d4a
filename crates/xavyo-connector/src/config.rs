//! Connector Framework configuration types
//!
//! Settings for the framework's search pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// Settings for [`search`](crate::search::search).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Upper bound on native queries per search. A filter that translates to
    /// more queries falls back to a single unconstrained query.
    #[serde(default = "default_max_native_queries")]
    pub max_native_queries: usize,

    /// Re-evaluate the caller's filter on every record. Only disable for
    /// connectors whose native queries are known to be exact.
    #[serde(default = "default_true")]
    pub enforce_filter: bool,
}

fn default_max_native_queries() -> usize {
    32
}

fn default_true() -> bool {
    true
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_native_queries: default_max_native_queries(),
            enforce_filter: default_true(),
        }
    }
}

impl SearchSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the native query limit.
    #[must_use]
    pub fn with_max_native_queries(mut self, max: usize) -> Self {
        self.max_native_queries = max;
        self
    }

    /// Trust native queries to be exact and skip in-memory filtering.
    #[must_use]
    pub fn trust_native_queries(mut self) -> Self {
        self.enforce_filter = false;
        self
    }

    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> ConnectorResult<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConnectorError::InvalidConfiguration {
                message: format!("invalid search settings: {e}"),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.max_native_queries == 0 {
            return Err(ConnectorError::InvalidConfiguration {
                message: "max_native_queries must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
