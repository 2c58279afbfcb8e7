//! Tool-specific error types.

use thiserror::Error;

use crate::domains::response::{ErrorKind, FormattedResult};

/// Errors raised while resolving or validating a tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::UnknownTool,
            Self::InvalidArguments(_) => ErrorKind::Validation,
        }
    }
}

impl From<ToolError> for FormattedResult {
    fn from(err: ToolError) -> Self {
        FormattedResult::error(err.kind(), err.to_string())
    }
}
