//! In-memory [`CoveoApi`] used by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use super::models::{
    AnswerCitation, GeneratedAnswer, Passage, PassageDocument, PassageResponse, SearchResponse,
    SearchResult, decode_json,
};
use super::{CoveoApi, CoveoError};

/// How the stub answers every call.
#[derive(Debug, Clone, Copy)]
pub enum StubBehaviour {
    /// Canned success payloads (two search hits, one passage, one answer).
    Succeed,
    /// Fail with the given HTTP status.
    Status(u16),
    /// Fail as if the body were not valid JSON.
    Malformed,
    /// Succeed after sleeping for the given time.
    Delay(Duration),
}

/// Counts started and completed calls and remembers the last requested limit.
#[derive(Debug)]
pub struct StubApi {
    behaviour: StubBehaviour,
    calls: AtomicUsize,
    completed: AtomicUsize,
    last_limit: AtomicU32,
}

impl StubApi {
    pub fn new(behaviour: StubBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            last_limit: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran to the end rather than being dropped mid-flight.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> u32 {
        self.last_limit.load(Ordering::SeqCst)
    }

    async fn record(&self, limit: u32) -> Result<(), CoveoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        let outcome = match self.behaviour {
            StubBehaviour::Succeed => Ok(()),
            StubBehaviour::Status(status) => Err(CoveoError::from_status(status, None, "stubbed")),
            StubBehaviour::Malformed => decode_json::<serde_json::Value>("{\"results\": [")
                .map(|_| ()),
            StubBehaviour::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}

fn search_hit(title: &str) -> SearchResult {
    SearchResult {
        title: Some(title.to_string()),
        click_uri: Some(format!("https://docs.example.com/{}", title.to_lowercase().replace(' ', "-"))),
        excerpt: Some(format!("Everything about {title}.")),
        ..SearchResult::default()
    }
}

#[async_trait]
impl CoveoApi for StubApi {
    async fn search(&self, _query: &str, limit: u32) -> Result<SearchResponse, CoveoError> {
        self.record(limit).await?;
        Ok(SearchResponse {
            total_count: Some(2),
            results: Some(vec![search_hit("Onboarding Guide"), search_hit("First Week")]),
        })
    }

    async fn retrieve_passages(
        &self,
        _query: &str,
        limit: u32,
    ) -> Result<PassageResponse, CoveoError> {
        self.record(limit).await?;
        Ok(PassageResponse {
            items: Some(vec![Passage {
                text: Some("Open Settings and choose Reset password.".to_string()),
                relevance_score: Some(0.87),
                document: Some(PassageDocument {
                    title: Some("Account help".to_string()),
                    clickable_uri: Some("https://docs.example.com/account".to_string()),
                    permanent_id: Some("doc-1".to_string()),
                }),
            }]),
            response_id: None,
        })
    }

    async fn answer(&self, _query: &str) -> Result<GeneratedAnswer, CoveoError> {
        self.record(0).await?;
        Ok(GeneratedAnswer {
            text: "Start with the onboarding guide.".to_string(),
            citations: vec![AnswerCitation {
                title: Some("Onboarding Guide".to_string()),
                click_uri: Some("https://docs.example.com/onboarding-guide".to_string()),
                ..AnswerCitation::default()
            }],
            answer_generated: Some(true),
        })
    }
}
