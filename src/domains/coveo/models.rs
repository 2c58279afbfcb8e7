//! Wire models for the Coveo platform.
//!
//! Every remote field is optional at the decode boundary. Unknown fields are
//! ignored so upstream schema additions never break decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::CoveoError;

const MESSAGE_EVENT: &str = "genqa.messageType";
const CITATIONS_EVENT: &str = "genqa.citationsType";
const END_OF_STREAM_EVENT: &str = "genqa.endOfStreamType";

/// Search API response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total_count: Option<u64>,
    pub results: Option<Vec<SearchResult>>,
}

/// A single search hit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub click_uri: Option<String>,
    pub printable_uri: Option<String>,
    pub excerpt: Option<String>,
}

/// Passage retrieval API response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageResponse {
    pub items: Option<Vec<Passage>>,
    pub response_id: Option<String>,
}

/// A retrieved passage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub text: Option<String>,
    pub relevance_score: Option<f64>,
    pub document: Option<PassageDocument>,
}

/// Source document of a passage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PassageDocument {
    pub title: Option<String>,
    #[serde(rename = "clickableuri")]
    pub clickable_uri: Option<String>,
    #[serde(rename = "permanentid")]
    pub permanent_id: Option<String>,
}

/// A source document cited by a generated answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCitation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// The assembled result of an answer stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedAnswer {
    pub text: String,
    pub citations: Vec<AnswerCitation>,
    pub answer_generated: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamEnvelope {
    payload_type: Option<String>,
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload {
    text_delta: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CitationsPayload {
    citations: Option<Vec<AnswerCitation>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndOfStreamPayload {
    answer_generated: Option<bool>,
}

impl StreamEnvelope {
    /// The payload is normally a JSON document encoded as a string.
    fn decode_payload<T>(&self) -> Result<T, CoveoError>
    where
        T: DeserializeOwned + Default,
    {
        match &self.payload {
            None | Some(serde_json::Value::Null) => Ok(T::default()),
            Some(serde_json::Value::String(raw)) if raw.trim().is_empty() => Ok(T::default()),
            Some(serde_json::Value::String(raw)) => serde_json::from_str(raw)
                .map_err(|e| CoveoError::parse(format!("invalid answer stream payload: {e}"))),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| CoveoError::parse(format!("invalid answer stream payload: {e}"))),
        }
    }
}

/// Decode a JSON response body.
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, CoveoError> {
    serde_json::from_str(body).map_err(|e| CoveoError::parse(e.to_string()))
}

/// Incremental parser for the answer endpoint's server-sent event stream.
///
/// Bytes are fed as they arrive; only complete lines are interpreted. Once
/// the end-of-stream event is seen the parser stops accepting input.
#[derive(Debug, Default)]
pub struct AnswerStreamParser {
    answer: GeneratedAnswer,
    pending: Vec<u8>,
    events: usize,
    finished: bool,
}

impl AnswerStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the end-of-stream event has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed a chunk of the body. Returns `true` once the stream is complete.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<bool, CoveoError> {
        if self.finished {
            return Ok(true);
        }
        self.pending.extend_from_slice(chunk);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.process_line(&line)?;
            if self.finished {
                self.pending.clear();
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Flush any trailing partial line and return the assembled answer.
    pub fn finish(mut self) -> Result<GeneratedAnswer, CoveoError> {
        if !self.finished && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.process_line(&line)?;
        }

        if self.events == 0 {
            return Err(CoveoError::parse("answer stream contained no events"));
        }
        Ok(self.answer)
    }

    fn process_line(&mut self, raw: &[u8]) -> Result<(), CoveoError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| CoveoError::parse(format!("answer stream is not UTF-8: {e}")))?;
        let Some(data) = line.trim().strip_prefix("data:") else {
            return Ok(());
        };
        let data = data.trim();
        if data.is_empty() {
            return Ok(());
        }

        let envelope: StreamEnvelope = serde_json::from_str(data)
            .map_err(|e| CoveoError::parse(format!("invalid answer stream event: {e}")))?;
        self.events += 1;

        match envelope.payload_type.as_deref() {
            Some(MESSAGE_EVENT) => {
                let payload: MessagePayload = envelope.decode_payload()?;
                if let Some(delta) = payload.text_delta {
                    self.answer.text.push_str(&delta);
                }
            }
            Some(CITATIONS_EVENT) => {
                let payload: CitationsPayload = envelope.decode_payload()?;
                self.answer.citations = payload.citations.unwrap_or_default();
            }
            Some(END_OF_STREAM_EVENT) => {
                let payload: EndOfStreamPayload = envelope.decode_payload()?;
                self.answer.answer_generated = payload.answer_generated;
                self.finished = true;
            }
            other => debug!("Ignoring answer stream event: {:?}", other),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_answer_stream(body: &str) -> Result<GeneratedAnswer, CoveoError> {
        let mut parser = AnswerStreamParser::new();
        parser.feed(body.as_bytes())?;
        parser.finish()
    }

    const STREAM: &str = concat!(
        "data:{\"payloadType\":\"genqa.headerMessageType\",\"payload\":\"{\\\"contentFormat\\\":\\\"text/markdown\\\"}\"}\n\n",
        "data:{\"payloadType\":\"genqa.messageType\",\"payload\":\"{\\\"textDelta\\\":\\\"This is \\\"}\"}\n\n",
        "data:{\"payloadType\":\"genqa.messageType\",\"payload\":\"{\\\"textDelta\\\":\\\"a test answer\\\"}\"}\n\n",
        "data:{\"payloadType\":\"genqa.citationsType\",\"payload\":\"{\\\"citations\\\":[{\\\"title\\\":\\\"Citation Title\\\",\\\"clickUri\\\":\\\"https://example.com/citation\\\"}]}\"}\n\n",
        "data:{\"payloadType\":\"genqa.endOfStreamType\",\"payload\":\"{\\\"answerGenerated\\\":true}\"}\n\n",
        "data:{\"payloadType\":\"genqa.messageType\",\"payload\":\"{\\\"textDelta\\\":\\\" ignored\\\"}\"}\n\n",
    );

    #[test]
    fn test_parse_answer_stream() {
        let answer = parse_answer_stream(STREAM).unwrap();
        assert_eq!(answer.text, "This is a test answer");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].title.as_deref(), Some("Citation Title"));
        assert_eq!(answer.answer_generated, Some(true));
    }

    #[test]
    fn test_parser_handles_split_chunks_and_stops_at_end() {
        let mut parser = AnswerStreamParser::new();
        let bytes = STREAM.as_bytes();
        let mut done = false;
        for chunk in bytes.chunks(7) {
            done = parser.feed(chunk).unwrap();
            if done {
                break;
            }
        }
        assert!(done);
        assert!(parser.is_finished());
        assert!(parser.feed(b"data: {broken\n").unwrap());

        let answer = parser.finish().unwrap();
        assert_eq!(answer.text, "This is a test answer");
        assert_eq!(answer.citations.len(), 1);
    }

    #[test]
    fn test_parser_without_trailing_newline() {
        let mut parser = AnswerStreamParser::new();
        let body = "data: {\"payloadType\":\"genqa.messageType\",\"payload\":{\"textDelta\":\"tail\"}}";
        assert!(!parser.feed(body.as_bytes()).unwrap());
        assert_eq!(parser.finish().unwrap().text, "tail");
    }

    #[test]
    fn test_parse_answer_stream_object_payload() {
        let body = "data: {\"payloadType\":\"genqa.messageType\",\"payload\":{\"textDelta\":\"Hi\"}}\n";
        let answer = parse_answer_stream(body).unwrap();
        assert_eq!(answer.text, "Hi");
    }

    #[test]
    fn test_parse_answer_stream_malformed_event() {
        let err = parse_answer_stream("data: {not json}\n").unwrap_err();
        assert!(matches!(err, CoveoError::Parse(_)));
    }

    #[test]
    fn test_parse_answer_stream_without_events() {
        let err = parse_answer_stream("{\"answer\":\"plain json\"}").unwrap_err();
        assert!(matches!(err, CoveoError::Parse(_)));
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let response: SearchResponse = decode_json(r#"{"results":[{}],"extra":1}"#).unwrap();
        let results = response.results.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], SearchResult::default());
        assert_eq!(response.total_count, None);
    }

    #[test]
    fn test_passage_document_field_names() {
        let response: PassageResponse = decode_json(
            r#"{"items":[{"text":"t","relevanceScore":0.95,"document":{"title":"Doc","permanentid":"p1","clickableuri":"https://example.com"}}]}"#,
        )
        .unwrap();
        let passage = &response.items.unwrap()[0];
        let document = passage.document.as_ref().unwrap();
        assert_eq!(document.permanent_id.as_deref(), Some("p1"));
        assert_eq!(document.clickable_uri.as_deref(), Some("https://example.com"));
        assert_eq!(passage.relevance_score, Some(0.95));
    }

    #[test]
    fn test_decode_json_malformed() {
        let err = decode_json::<SearchResponse>("<html>oops</html>").unwrap_err();
        assert!(matches!(err, CoveoError::Parse(_)));
    }
}
