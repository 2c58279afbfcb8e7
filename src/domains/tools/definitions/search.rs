//! Coveo keyword search tool.
//!
//! Returns document metadata (titles, URIs, excerpts) rather than content.

use tracing::info;

use crate::domains::coveo::{CoveoApi, MAX_RESULTS, resolve_limit};
use crate::domains::response::{FormattedResult, format_error, format_search};
use crate::domains::tools::definition::{
    ParamKind, ParameterSpec, ToolDefinition, ValidatedArguments,
};
use crate::domains::tools::handlers::ToolHandler;

static DEFINITION: ToolDefinition = ToolDefinition {
    name: SearchCoveoTool::NAME,
    description: "Use search_coveo when the goal is to retrieve metadata, titles, or URLs related to documents. \
        Ideal for exploring information broadly, navigating multiple sources, or presenting lists of content \
        without needing the content itself.",
    parameters: &[
        ParameterSpec {
            name: "query",
            kind: ParamKind::String,
            required: true,
            default: None,
            description: "The search query.",
        },
        ParameterSpec {
            name: "numberOfResults",
            kind: ParamKind::Integer,
            required: false,
            default: Some(5),
            description: "How many results to retrieve. Default: 5.",
        },
    ],
};

/// Keyword search over the Coveo index.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCoveoTool;

impl SearchCoveoTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_coveo";
}

#[async_trait::async_trait]
impl ToolHandler for SearchCoveoTool {
    fn definition(&self) -> &'static ToolDefinition {
        &DEFINITION
    }

    async fn execute(&self, api: &dyn CoveoApi, arguments: &ValidatedArguments) -> FormattedResult {
        let query = arguments.string("query").unwrap_or_default();
        let limit = resolve_limit(arguments.integer("numberOfResults"), MAX_RESULTS);
        info!("search_coveo: numberOfResults={}", limit);

        match api.search(query, limit).await {
            Ok(mut response) => {
                if let Some(results) = response.results.as_mut() {
                    results.truncate(limit as usize);
                }
                format_search(query, &response)
            }
            Err(e) => format_error(&e),
        }
    }
}
