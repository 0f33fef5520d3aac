//! Error types for codegraph-dataflow
//!
//! Solvers never fail: flow and edge functions are trusted to be pure and
//! monotone. Errors only come from the surfaces around them (loading IR,
//! reading configuration, writing exports, selecting analyses).

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for codegraph-dataflow operations
#[derive(Debug, Error)]
pub enum DataflowError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The program could not be turned into a supergraph
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Analysis name not in the closed selection set
    #[error("Unknown analysis '{0}'")]
    UnknownAnalysis(String),

    /// Entry function requested but not defined in the program
    #[error("Unknown entry function '{0}'")]
    UnknownEntry(String),
}

impl DataflowError {
    /// Create a malformed-input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        DataflowError::MalformedInput(msg.into())
    }
}

/// Result type alias for dataflow operations
pub type Result<T> = std::result::Result<T, DataflowError>;
