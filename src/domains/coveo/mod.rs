//! Coveo platform domain.
//!
//! This module wraps the three remote operations the server exposes:
//! - `search`: keyword search returning document metadata
//! - `retrieve_passages`: passage extraction for grounding
//! - `answer`: generative question answering with citations
//!
//! The [`CoveoApi`] trait is the seam between tool dispatch and the network,
//! so tools can be exercised against an in-memory stub.

mod client;
mod error;
pub mod models;
#[cfg(test)]
pub(crate) mod stub;

use async_trait::async_trait;

pub use client::CoveoClient;
pub use error::CoveoError;
pub use models::{
    AnswerCitation, GeneratedAnswer, Passage, PassageDocument, PassageResponse, SearchResponse,
    SearchResult,
};

/// Result count used when the caller gives none, or a non-positive one.
pub const DEFAULT_LIMIT: u32 = 5;

/// Largest `numberOfResults` forwarded to the search endpoint.
pub const MAX_RESULTS: u32 = 100;

/// Largest `maxPassages` accepted by the passage endpoint.
pub const MAX_PASSAGES: u32 = 20;

/// Remote operations offered by the Coveo platform.
#[async_trait]
pub trait CoveoApi: Send + Sync {
    /// Keyword search. A `limit` of zero means [`DEFAULT_LIMIT`].
    async fn search(&self, query: &str, limit: u32) -> Result<SearchResponse, CoveoError>;

    /// Passage retrieval. A `limit` of zero means [`DEFAULT_LIMIT`].
    async fn retrieve_passages(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<PassageResponse, CoveoError>;

    /// Generative answer for a question.
    async fn answer(&self, query: &str) -> Result<GeneratedAnswer, CoveoError>;
}

/// Resolve a requested result count.
///
/// Missing or non-positive values fall back to [`DEFAULT_LIMIT`]; values above
/// `max` are clamped.
pub fn resolve_limit(requested: Option<i64>, max: u32) -> u32 {
    match requested {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(max).min(max),
        _ => DEFAULT_LIMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, MAX_RESULTS), 5);
        assert_eq!(resolve_limit(Some(0), MAX_RESULTS), 5);
        assert_eq!(resolve_limit(Some(-3), MAX_RESULTS), 5);
        assert_eq!(resolve_limit(Some(3), MAX_RESULTS), 3);
        assert_eq!(resolve_limit(Some(50), MAX_PASSAGES), 20);
        assert_eq!(resolve_limit(Some(i64::MAX), MAX_RESULTS), 100);
    }
}
