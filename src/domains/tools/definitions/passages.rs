//! Coveo passage retrieval tool.

use tracing::info;

use crate::domains::coveo::{CoveoApi, MAX_PASSAGES, resolve_limit};
use crate::domains::response::{FormattedResult, format_error, format_passages};
use crate::domains::tools::definition::{
    ParamKind, ParameterSpec, ToolDefinition, ValidatedArguments,
};
use crate::domains::tools::handlers::ToolHandler;

static DEFINITION: ToolDefinition = ToolDefinition {
    name: PassageRetrievalTool::NAME,
    description: "Use passage_retrieval to extract highly relevant text snippets from documents. \
        Useful when building answers, summaries, or even new documents from source material. \
        Choose this tool when you need accurate, content-rich inputs to support generation beyond \
        what a single answer can provide.",
    parameters: &[
        ParameterSpec {
            name: "query",
            kind: ParamKind::String,
            required: true,
            default: None,
            description: "The search query.",
        },
        ParameterSpec {
            name: "numberOfPassages",
            kind: ParamKind::Integer,
            required: false,
            default: Some(5),
            description: "How many passages to retrieve. Default: 5. Maximum: 20.",
        },
    ],
};

/// Passage extraction from indexed documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassageRetrievalTool;

impl PassageRetrievalTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "passage_retrieval";
}

#[async_trait::async_trait]
impl ToolHandler for PassageRetrievalTool {
    fn definition(&self) -> &'static ToolDefinition {
        &DEFINITION
    }

    async fn execute(&self, api: &dyn CoveoApi, arguments: &ValidatedArguments) -> FormattedResult {
        let query = arguments.string("query").unwrap_or_default();
        let limit = resolve_limit(arguments.integer("numberOfPassages"), MAX_PASSAGES);
        info!("passage_retrieval: numberOfPassages={}", limit);

        match api.retrieve_passages(query, limit).await {
            Ok(mut response) => {
                if let Some(items) = response.items.as_mut() {
                    items.truncate(limit as usize);
                }
                format_passages(query, &response)
            }
            Err(e) => format_error(&e),
        }
    }
}
