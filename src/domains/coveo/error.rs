//! Coveo client error types.

use std::time::Duration;
use thiserror::Error;

use crate::domains::response::ErrorKind;

/// Longest slice of a remote error body quoted back to the caller.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Errors produced while calling the Coveo platform.
#[derive(Debug, Error)]
pub enum CoveoError {
    /// The request was rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 401 or 403 from the platform.
    #[error("authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// 429 from the platform.
    #[error("rate limited by the Coveo platform (HTTP 429){}: {message}", retry_suffix(.retry_after))]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// 5xx from the platform.
    #[error("upstream service error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Any other non-success status.
    #[error("bad request (HTTP {status}): {message}")]
    BadRequest { status: u16, message: String },

    /// Connection failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(", retry after {}s", d.as_secs()))
        .unwrap_or_default()
}

impl CoveoError {
    /// Create an "invalid input" error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Classify a failed HTTP exchange by status code.
    pub fn from_status(status: u16, retry_after: Option<Duration>, body: &str) -> Self {
        let message = error_message(status, body);
        match status {
            401 | 403 => Self::Auth { status, message },
            429 => Self::RateLimited {
                retry_after,
                message,
            },
            500..=599 => Self::Upstream { status, message },
            400..=499 => Self::BadRequest { status, message },
            _ => Self::Upstream { status, message },
        }
    }

    /// Classify a reqwest failure that happened before a status was received.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::Validation,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Network(_) => ErrorKind::Network,
            Self::Parse(_) => ErrorKind::Parse,
        }
    }
}

/// Prefer the platform's own `message` field, fall back to the raw body.
fn error_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return format!("empty response body (status {status})");
    }

    if message.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{truncated}...")
    } else {
        message
    }
}
