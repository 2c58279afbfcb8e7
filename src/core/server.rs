//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tool registry.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each tool declares a static [`ToolDefinition`](crate::domains::tools::ToolDefinition)
//! and an `execute()` method. The [`ToolRegistry`] owns the ordered list and
//! is the single dispatch path shared by every transport.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::*,
    service::RequestContext,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use crate::domains::coveo::{CoveoApi, CoveoClient};
use crate::domains::tools::{ToolInvocation, ToolRegistry};

/// Instructions returned to clients during initialization.
pub const INSTRUCTIONS: &str = "Coveo search tools. Use search_coveo to find documents, \
passage_retrieval to fetch relevant text passages, and answer_question to get a generated \
answer with cited sources.";

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp for the STDIO
/// transport and exposes the same operations directly for the HTTP transports.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registry of the exposed tools.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server backed by the Coveo platform.
    pub fn new(config: Config) -> Result<Self> {
        let client = CoveoClient::new(Arc::new(config.coveo.clone()))?;
        Ok(Self::with_api(config, Arc::new(client)))
    }

    /// Create a server backed by an arbitrary [`CoveoApi`] implementation.
    pub fn with_api(config: Config, api: Arc<dyn CoveoApi>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ToolRegistry::new(api)),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// List all available tools, in registry order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.tools()
    }

    /// Call a tool by name.
    ///
    /// Failures are reported inside the returned result (`is_error`), never
    /// as a protocol error.
    pub async fn call_tool(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        self.registry
            .invoke(ToolInvocation::new(name, arguments))
            .await
            .into()
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        Ok(McpServer::call_tool(self, &request.name, arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::coveo::stub::{StubApi, StubBehaviour};
    use serde_json::json;

    fn server(behaviour: StubBehaviour) -> McpServer {
        McpServer::with_api(Config::default(), Arc::new(StubApi::new(behaviour)))
    }

    fn args(value: serde_json::Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_server_info() {
        let server = server(StubBehaviour::Succeed);
        let info = server.get_info();
        assert_eq!(info.server_info.name, "coveo-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("search_coveo"));
    }

    #[test]
    fn test_list_tools_order() {
        let names: Vec<String> = server(StubBehaviour::Succeed)
            .list_tools()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(names, ["search_coveo", "passage_retrieval", "answer_question"]);
    }

    #[tokio::test]
    async fn test_call_tool_success_has_structured_content() {
        let result = server(StubBehaviour::Succeed)
            .call_tool("search_coveo", args(json!({ "query": "onboarding" })))
            .await;
        assert_eq!(result.is_error, Some(false));
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["query"], "onboarding");
    }

    #[tokio::test]
    async fn test_call_tool_failure_is_tool_error() {
        let result = server(StubBehaviour::Status(401))
            .call_tool("answer_question", args(json!({ "query": "q" })))
            .await;
        assert_eq!(result.is_error, Some(true));
        let text = result.content[0].as_text().unwrap().text.clone();
        assert!(text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = server(StubBehaviour::Succeed)
            .call_tool("nope", JsonObject::new())
            .await;
        assert_eq!(result.is_error, Some(true));
    }
}
