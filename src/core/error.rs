//! Error types and handling for the MCP server.
//!
//! This module defines the error type returned while building the server:
//! configuration problems and failures to build the Coveo client. Tool-call
//! failures never surface through this type. They are rendered into tool
//! results at the registry boundary.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the Coveo client.
    #[error("Coveo error: {0}")]
    Coveo(#[from] crate::domains::coveo::CoveoError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
