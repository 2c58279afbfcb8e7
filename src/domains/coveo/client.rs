//! HTTP client for the Coveo search, passage and answer endpoints.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, RETRY_AFTER};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::error::CoveoError;
use super::models::{
    AnswerStreamParser, GeneratedAnswer, PassageResponse, SearchResponse, decode_json,
};
use super::{CoveoApi, DEFAULT_LIMIT};
use crate::core::config::CoveoConfig;

const USER_AGENT: &str = concat!("coveo-mcp-server/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_FIELDS: [&str; 5] = ["title", "uri", "excerpt", "printableUri", "clickUri"];
const EXCERPT_LENGTH: u32 = 500;

/// Coveo platform client.
///
/// Holds a pooled `reqwest` client and the immutable platform configuration.
/// Each operation issues exactly one HTTP call and never retries.
#[derive(Clone)]
pub struct CoveoClient {
    http: reqwest::Client,
    config: Arc<CoveoConfig>,
}

impl CoveoClient {
    /// Create a new client for the given configuration.
    pub fn new(config: Arc<CoveoConfig>) -> Result<Self, CoveoError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CoveoError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Send a prepared request and return the response once its status is
    /// known to be successful.
    async fn open(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, CoveoError> {
        let response = request
            .bearer_auth(&self.config.api_key)
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(CoveoError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();

        let err = CoveoError::from_status(status.as_u16(), retry_after, &body);
        warn!("Coveo request failed: {}", err);
        Err(err)
    }

    /// Send a prepared request and return the full body of a successful response.
    async fn send(&self, request: RequestBuilder, timeout: Duration) -> Result<String, CoveoError> {
        let started = Instant::now();
        let response = self.open(request, timeout).await?;
        let status = response.status();
        let body = response.text().await.map_err(CoveoError::from_transport)?;
        debug!(
            "Coveo responded {} in {:?} ({} bytes)",
            status,
            started.elapsed(),
            body.len()
        );
        Ok(body)
    }
}

fn require_query(query: &str) -> Result<&str, CoveoError> {
    let query = query.trim();
    if query.is_empty() {
        Err(CoveoError::invalid_input("query cannot be empty"))
    } else {
        Ok(query)
    }
}

fn effective_limit(limit: u32) -> u32 {
    if limit == 0 { DEFAULT_LIMIT } else { limit }
}

#[async_trait]
impl CoveoApi for CoveoClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: u32) -> Result<SearchResponse, CoveoError> {
        let query = require_query(query)?;
        let limit = effective_limit(limit);
        info!("Searching Coveo (numberOfResults={})", limit);

        let payload = json!({
            "q": query,
            "numberOfResults": limit,
            "fieldsToInclude": SEARCH_FIELDS,
            "fieldsToExclude": ["rankingInfo"],
            "excerptLength": EXCERPT_LENGTH,
            "debugRankingInformation": false,
            "locale": self.config.locale,
            "timezone": self.config.timezone,
        });

        let request = self
            .http
            .post(self.config.search_endpoint())
            .header(ACCEPT, "application/json")
            .json(&payload);

        let body = self.send(request, self.config.request_timeout()).await?;
        decode_json(&body)
    }

    #[instrument(skip(self))]
    async fn retrieve_passages(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<PassageResponse, CoveoError> {
        let query = require_query(query)?;
        let limit = effective_limit(limit);
        info!("Retrieving Coveo passages (maxPassages={})", limit);

        let payload = json!({
            "query": query,
            "maxPassages": limit,
            "localization": {
                "locale": self.config.locale,
                "timezone": self.config.timezone,
            },
            "context": {},
            "additionalFields": [],
        });

        let mut request = self
            .http
            .post(self.config.passages_endpoint())
            .header(ACCEPT, "application/json")
            .json(&payload);

        // OAuth tokens carry the organization as a query parameter, API keys as a header.
        request = if self.config.uses_oauth_token() {
            request.query(&[("organizationId", self.config.organization_id.as_str())])
        } else {
            request.header("organizationId", self.config.organization_id.as_str())
        };

        let body = self.send(request, self.config.request_timeout()).await?;
        decode_json(&body)
    }

    #[instrument(skip(self))]
    async fn answer(&self, query: &str) -> Result<GeneratedAnswer, CoveoError> {
        let query = require_query(query)?;
        info!("Generating Coveo answer (config={})", self.config.answer_config_id);

        let payload = json!({
            "q": query,
            "context": "",
            "pipelineRuleParameters": {
                "mlGenerativeQuestionAnswering": {
                    "responseFormat": {
                        "contentFormat": ["text/markdown", "text/plain"]
                    }
                }
            }
        });

        let request = self
            .http
            .post(self.config.answer_endpoint())
            .header(ACCEPT, "application/json, text/event-stream")
            .header(ACCEPT_LANGUAGE, self.config.locale.as_str())
            .json(&payload);

        let started = Instant::now();
        let mut response = self.open(request, self.config.answer_timeout()).await?;
        let mut parser = AnswerStreamParser::new();

        // The platform may hold the connection open after the final event.
        while let Some(chunk) = response.chunk().await.map_err(CoveoError::from_transport)? {
            if parser.feed(&chunk)? {
                break;
            }
        }
        debug!(
            "Answer stream read in {:?} (complete: {})",
            started.elapsed(),
            parser.is_finished()
        );

        parser.finish()
    }
}
