//! Formatted tool results and the error taxonomy.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::domains::coveo::AnswerCitation;

/// Classes of failure a tool call can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or mistyped tool arguments. Never reaches the network.
    Validation,
    /// The requested tool does not exist.
    UnknownTool,
    /// 401/403 from the platform.
    Auth,
    /// 429 from the platform.
    RateLimited,
    /// 5xx from the platform.
    Upstream,
    /// Other 4xx from the platform.
    BadRequest,
    /// Connect failure or timeout.
    Network,
    /// Malformed remote body.
    Parse,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation => "validation error",
            Self::UnknownTool => "unknown tool",
            Self::Auth => "authentication error",
            Self::RateLimited => "rate limited",
            Self::Upstream => "upstream error",
            Self::BadRequest => "bad request",
            Self::Network => "network error",
            Self::Parse => "parse error",
        }
    }
}

/// Whether a tool call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    Error(ErrorKind),
}

/// The rendered outcome of a tool call.
///
/// Produced once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResult {
    pub kind: ResultKind,
    pub text: String,
    pub structured: Option<serde_json::Value>,
    pub citations: Vec<AnswerCitation>,
}

impl FormattedResult {
    /// Create a successful result with text content.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: ResultKind::Success,
            text: text.into(),
            structured: None,
            citations: Vec::new(),
        }
    }

    /// Create an error result. The text is prefixed with `Error: `.
    pub fn error(kind: ErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            kind: ResultKind::Error(kind),
            text: format!("Error: {}", message.as_ref()),
            structured: None,
            citations: Vec::new(),
        }
    }

    /// Attach a structured payload.
    pub fn with_structured<T: Serialize>(mut self, payload: &T) -> Self {
        self.structured = serde_json::to_value(payload).ok();
        self
    }

    /// Attach citations.
    pub fn with_citations(mut self, citations: Vec<AnswerCitation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind == ResultKind::Success
    }

    /// The error class, if this is an error result.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.kind {
            ResultKind::Success => None,
            ResultKind::Error(kind) => Some(kind),
        }
    }
}

impl From<FormattedResult> for CallToolResult {
    fn from(result: FormattedResult) -> Self {
        match result.kind {
            ResultKind::Success => {
                let mut call_result = CallToolResult::success(vec![Content::text(result.text)]);
                call_result.structured_content = result.structured;
                call_result
            }
            ResultKind::Error(_) => CallToolResult::error(vec![Content::text(result.text)]),
        }
    }
}
