//! Error types for dataset loading and pluggable layout strategies.

use thiserror::Error;

/// Errors raised at the dataset loading boundary.
///
/// Structural problems inside a successfully parsed dataset (dangling edges,
/// duplicate ids) are never errors; they are counted in
/// [`LoadReport`](crate::graph::LoadReport) instead.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The dataset could not be parsed as YAML.
    #[error("Failed to parse YAML dataset: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The dataset could not be parsed as JSON.
    #[error("Failed to parse JSON dataset: {0}")]
    Json(#[from] serde_json::Error),

    /// The dataset file could not be read.
    #[error("Failed to read dataset '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    /// Stable error code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Yaml(_) => "DATASET_YAML",
            Self::Json(_) => "DATASET_JSON",
            Self::Io { .. } => "DATASET_IO",
        }
    }
}

/// Errors raised by a layout strategy.
///
/// The orchestrator never propagates these to the caller; they are turned
/// into a fallback layout plus a [`LayoutWarning`](crate::graph::LayoutWarning).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LayoutError {
    /// The strategy rejected the request.
    #[error("Layout strategy '{strategy}' failed: {message}")]
    StrategyFailed {
        /// Strategy identifier.
        strategy: String,
        /// Failure description.
        message: String,
    },

    /// The strategy did not resolve within the configured timeout.
    #[error("Layout strategy '{strategy}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Strategy identifier.
        strategy: String,
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The strategy returned positions that don't cover the requested nodes.
    #[error("Layout strategy '{strategy}' returned no position for node '{node_id}'")]
    MissingPosition {
        /// Strategy identifier.
        strategy: String,
        /// Node that was left unpositioned.
        node_id: String,
    },
}

impl LayoutError {
    /// Stable error code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StrategyFailed { .. } => "STRATEGY_FAILED",
            Self::Timeout { .. } => "STRATEGY_TIMEOUT",
            Self::MissingPosition { .. } => "MISSING_POSITION",
        }
    }
}
