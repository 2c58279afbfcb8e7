//! Tool definitions module.
//!
//! Each tool is defined in its own file.

pub mod answer;
pub mod passages;
pub mod search;

pub use answer::AnswerQuestionTool;
pub use passages::PassageRetrievalTool;
pub use search::SearchCoveoTool;
