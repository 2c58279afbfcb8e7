//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - The fixed, ordered list of exposed tools
//! - Argument validation against each tool's static definition
//! - Dispatch to the Coveo client and response formatter
//!
//! Every transport goes through [`ToolRegistry::invoke`], so a tool call
//! always yields a [`FormattedResult`], never a raw fault.

use rmcp::model::Tool;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::definitions::{AnswerQuestionTool, PassageRetrievalTool, SearchCoveoTool};
use super::error::ToolError;
use super::handlers::{ToolHandler, ToolInvocation};
use crate::domains::coveo::CoveoApi;
use crate::domains::response::FormattedResult;

/// Tool registry - owns the tool handlers and the Coveo client they share.
///
/// Holds no mutable state; concurrent invocations are independent.
pub struct ToolRegistry {
    api: Arc<dyn CoveoApi>,
    handlers: Vec<Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new tool registry backed by `api`.
    pub fn new(api: Arc<dyn CoveoApi>) -> Self {
        Self {
            api,
            handlers: vec![
                Box::new(SearchCoveoTool),
                Box::new(PassageRetrievalTool),
                Box::new(AnswerQuestionTool),
            ],
        }
    }

    /// Get all tool names, in listing order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.definition().name).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn tools(&self) -> Vec<Tool> {
        self.handlers.iter().map(|h| h.definition().to_tool()).collect()
    }

    fn handler(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.handlers
            .iter()
            .find(|h| h.definition().name == name)
            .map(|h| h.as_ref())
    }

    /// Validate and run one tool call.
    #[instrument(skip_all, fields(tool = %invocation.tool_name))]
    pub async fn invoke(&self, invocation: ToolInvocation) -> FormattedResult {
        let Some(handler) = self.handler(&invocation.tool_name) else {
            warn!("Unknown tool requested: {}", invocation.tool_name);
            return ToolError::not_found(&invocation.tool_name).into();
        };

        let arguments = match handler.definition().validate(&invocation.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!("Rejected tool call: {}", e);
                return e.into();
            }
        };

        let result = handler.execute(self.api.as_ref(), &arguments).await;
        match result.error_kind() {
            None => info!("Tool call succeeded"),
            Some(kind) => warn!("Tool call failed: {}", kind.label()),
        }
        result
    }
}
