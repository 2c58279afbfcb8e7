//! Tool handler seam.
//!
//! Every tool implements [`ToolHandler`]: it publishes a static
//! [`ToolDefinition`] and turns validated arguments into a
//! [`FormattedResult`] by way of the Coveo client.

use serde::{Deserialize, Serialize};

use super::definition::{ToolDefinition, ValidatedArguments};
use crate::domains::coveo::CoveoApi;
use crate::domains::response::FormattedResult;

/// One inbound tool call. Created per request and consumed once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The name of the tool to execute.
    pub tool_name: String,

    /// The arguments to pass to the tool.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ToolInvocation {
    pub fn new(
        tool_name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Trait implemented by every exposed tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Static description of the tool and its parameters.
    fn definition(&self) -> &'static ToolDefinition;

    /// Run the tool. Arguments have already been validated against
    /// [`ToolHandler::definition`].
    async fn execute(&self, api: &dyn CoveoApi, arguments: &ValidatedArguments) -> FormattedResult;
}
