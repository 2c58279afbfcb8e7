//! Tool response domain.
//!
//! Turns remote payloads and failures into [`FormattedResult`] values, the
//! single shape every transport hands back to the calling agent.

mod formatter;
mod result;

pub use formatter::{format_answer, format_error, format_passages, format_search};
pub use result::{ErrorKind, FormattedResult, ResultKind};
