//! Response formatter.
//!
//! Pure functions from decoded Coveo payloads to [`FormattedResult`]. Missing
//! fields degrade to partial output; the same input always renders the same
//! text.

use serde::Serialize;
use std::fmt::Write;

use super::result::FormattedResult;
use crate::domains::coveo::{
    AnswerCitation, CoveoError, GeneratedAnswer, Passage, PassageResponse, SearchResponse,
    SearchResult,
};

const NO_RESULTS: &str = "No results found for this query.";
const NO_PASSAGES: &str = "No passages found for this query.";
const NO_ANSWER: &str = "No answer could be generated for this query.";
const UNTITLED: &str = "Untitled";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchPayload<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<u64>,
    results: Vec<SearchHit<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    click_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    printable_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PassagePayload<'a> {
    query: &'a str,
    passages: Vec<PassageEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PassageEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relevance_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permanent_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerPayload<'a> {
    answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_generated: Option<bool>,
    citations: &'a [AnswerCitation],
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn hit_link(result: &SearchResult) -> Option<&str> {
    non_empty(&result.click_uri)
        .or_else(|| non_empty(&result.uri))
        .or_else(|| non_empty(&result.printable_uri))
}

/// Render a search response.
pub fn format_search(query: &str, response: &SearchResponse) -> FormattedResult {
    let results = response.results.as_deref().unwrap_or_default();
    if results.is_empty() {
        return FormattedResult::success(NO_RESULTS).with_structured(&SearchPayload {
            query,
            total_count: response.total_count,
            results: Vec::new(),
        });
    }

    let mut text = format!("Found {} result(s) for '{}'", results.len(), query);
    if let Some(total) = response.total_count {
        let _ = write!(text, " ({} total matches)", total);
    }
    text.push_str(":\n");

    for (i, result) in results.iter().enumerate() {
        let _ = write!(
            text,
            "\n{}. {}\n",
            i + 1,
            non_empty(&result.title).unwrap_or(UNTITLED)
        );
        if let Some(link) = hit_link(result) {
            let _ = writeln!(text, "   {}", link);
        }
        if let Some(excerpt) = non_empty(&result.excerpt) {
            let _ = writeln!(text, "   {}", excerpt);
        }
    }

    let payload = SearchPayload {
        query,
        total_count: response.total_count,
        results: results
            .iter()
            .map(|r| SearchHit {
                title: non_empty(&r.title),
                uri: non_empty(&r.uri),
                click_uri: non_empty(&r.click_uri),
                printable_uri: non_empty(&r.printable_uri),
                excerpt: non_empty(&r.excerpt),
            })
            .collect(),
    };

    FormattedResult::success(text.trim_end()).with_structured(&payload)
}

fn passage_entry(passage: &Passage) -> PassageEntry<'_> {
    let document = passage.document.as_ref();
    PassageEntry {
        text: non_empty(&passage.text),
        relevance_score: passage.relevance_score,
        title: document.and_then(|d| non_empty(&d.title)),
        uri: document.and_then(|d| non_empty(&d.clickable_uri)),
        permanent_id: document.and_then(|d| non_empty(&d.permanent_id)),
    }
}

/// Render a passage retrieval response.
pub fn format_passages(query: &str, response: &PassageResponse) -> FormattedResult {
    let passages = response.items.as_deref().unwrap_or_default();
    if passages.is_empty() {
        return FormattedResult::success(NO_PASSAGES).with_structured(&PassagePayload {
            query,
            passages: Vec::new(),
        });
    }

    let entries: Vec<PassageEntry<'_>> = passages.iter().map(passage_entry).collect();

    let mut text = format!("Found {} passage(s) for '{}':\n", entries.len(), query);
    for (i, entry) in entries.iter().enumerate() {
        let _ = write!(text, "\n[{}] {}", i + 1, entry.title.unwrap_or(UNTITLED));
        if let Some(uri) = entry.uri {
            let _ = write!(text, " <{}>", uri);
        }
        if let Some(score) = entry.relevance_score {
            let _ = write!(text, " (relevance: {:.2})", score);
        }
        text.push('\n');
        if let Some(body) = entry.text {
            let _ = writeln!(text, "{}", body);
        }
    }

    let payload = PassagePayload {
        query,
        passages: entries,
    };
    FormattedResult::success(text.trim_end()).with_structured(&payload)
}

/// Render a generated answer, appending a numbered source list.
pub fn format_answer(answer: &GeneratedAnswer) -> FormattedResult {
    let body = answer.text.trim();
    let payload = AnswerPayload {
        answer: body,
        answer_generated: answer.answer_generated,
        citations: &answer.citations,
    };

    if body.is_empty() {
        return FormattedResult::success(NO_ANSWER)
            .with_structured(&payload)
            .with_citations(answer.citations.clone());
    }

    let mut text = body.to_string();
    if !answer.citations.is_empty() {
        text.push_str("\n\n**Sources:**\n");
        for (i, citation) in answer.citations.iter().enumerate() {
            let title = non_empty(&citation.title).unwrap_or(UNTITLED);
            let link = non_empty(&citation.click_uri)
                .or_else(|| non_empty(&citation.uri))
                .unwrap_or("#");
            let _ = writeln!(text, "{}. [{}]({})", i + 1, title, link);
        }
    }

    FormattedResult::success(text.trim_end())
        .with_structured(&payload)
        .with_citations(answer.citations.clone())
}

/// Render a client failure.
pub fn format_error(err: &CoveoError) -> FormattedResult {
    FormattedResult::error(err.kind(), err.to_string())
}
