//! Coveo generative answering tool.

use tracing::info;

use crate::domains::coveo::CoveoApi;
use crate::domains::response::{FormattedResult, format_answer, format_error};
use crate::domains::tools::definition::{
    ParamKind, ParameterSpec, ToolDefinition, ValidatedArguments,
};
use crate::domains::tools::handlers::ToolHandler;

static DEFINITION: ToolDefinition = ToolDefinition {
    name: AnswerQuestionTool::NAME,
    description: "Use answer_question when the query requires a complete, consistent, and well-structured answer. \
        This tool uses a prompt-engineered LLM, combining passages and documents, with safeguards to reduce \
        hallucinations, ensure factual accuracy, and enforce security constraints. Designed for delivering \
        clear, direct answers that are ready to consume.",
    parameters: &[ParameterSpec {
        name: "query",
        kind: ParamKind::String,
        required: true,
        default: None,
        description: "The question to answer.",
    }],
};

/// Generated answer with source citations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerQuestionTool;

impl AnswerQuestionTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "answer_question";
}

#[async_trait::async_trait]
impl ToolHandler for AnswerQuestionTool {
    fn definition(&self) -> &'static ToolDefinition {
        &DEFINITION
    }

    async fn execute(&self, api: &dyn CoveoApi, arguments: &ValidatedArguments) -> FormattedResult {
        let query = arguments.string("query").unwrap_or_default();
        info!("answer_question: generating answer");

        match api.answer(query).await {
            Ok(answer) => format_answer(&answer),
            Err(e) => format_error(&e),
        }
    }
}
