//! Grounded AI search for competitors
//!
//! The bundled collaborator calls Gemini `generateContent` with the
//! `google_search` tool enabled, asks for a JSON list of competitors and
//! reads search queries and citations from the grounding metadata.

use crate::competitors::{Citation, Competitor, CompetitorResult};
use crate::config::{FetcherConfig, GroundedConfig};
use crate::crawler::build_client_with_timeout;
use crate::{Result, SurveyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// A search-grounded generative collaborator
#[async_trait]
pub trait GroundedSearch: Send + Sync {
    /// Searches for competitors of `domain` in the context of `query`
    ///
    /// Returns `SurveyError::NotConfigured` when the collaborator cannot be
    /// used at all.
    async fn search(&self, domain: &str, query: &str, max_results: usize)
        -> Result<CompetitorResult>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GroundingMetadata {
    web_search_queries: Vec<String>,
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

/// The JSON answer requested from the model
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompetitorAnswer {
    competitors: Vec<AnswerEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnswerEntry {
    name: Option<String>,
    url: Option<String>,
    description: Option<String>,
    relevance: Option<String>,
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Removes a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().trim_end_matches("```").trim()
}

/// Gemini with Google Search grounding
pub struct GeminiGroundedSearch {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGroundedSearch {
    /// Creates a client; `api_key: None` makes every search fail as not configured
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    /// Reads the API key from the environment variable named in config
    pub fn from_config(grounded: &GroundedConfig, fetcher: &FetcherConfig) -> Result<Self> {
        let api_key = std::env::var(&grounded.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::debug!(
                "{} is not set; grounded competitor search disabled",
                grounded.api_key_env
            );
        }

        let client =
            build_client_with_timeout(fetcher, Duration::from_secs(grounded.timeout_secs))?;
        Ok(Self::new(
            client,
            grounded.endpoint.as_str(),
            grounded.model.as_str(),
            api_key,
        ))
    }

    fn request_body(domain: &str, query: &str, max_results: usize) -> serde_json::Value {
        let instruction = format!(
            "You are a market and competitor analyst. Use Google Search to find the most \
             relevant current competitors for the given domain and topic. Answer ONLY with a \
             JSON object with the field 'competitors': a list of objects with 'name' (company \
             name), 'url' (website URL), 'description' (short description) and 'relevance' \
             (why it is a competitor). At most {} competitors.",
            max_results
        );
        let prompt = format!(
            "Find the main competitors of this website:\nDomain: {}\nSearch context: {}\n\n\
             Look for direct competitors offering similar products or services.",
            domain, query
        );

        json!({
            "systemInstruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "tools": [{ "google_search": {} }]
        })
    }
}

/// Converts a generateContent response into a competitor result
fn into_result(response: GenerateResponse, max_results: usize) -> CompetitorResult {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return CompetitorResult::default();
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let answer: CompetitorAnswer = match serde_json::from_str(strip_code_fence(&text)) {
        Ok(answer) => answer,
        Err(e) => {
            tracing::debug!("Grounded answer is not valid JSON: {}", e);
            CompetitorAnswer::default()
        }
    };

    let competitors = answer
        .competitors
        .into_iter()
        .map(|entry| Competitor {
            name: clean(entry.name),
            url: clean(entry.url),
            description: clean(entry.description),
            relevance: clean(entry.relevance),
        })
        .filter(|c| !c.name.is_empty() || !c.url.is_empty())
        .take(max_results)
        .collect();

    let metadata = candidate.grounding_metadata.unwrap_or_default();
    let citations = metadata
        .grounding_chunks
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .map(|web| Citation {
            title: clean(web.title),
            url: clean(web.uri),
        })
        .collect();

    CompetitorResult {
        competitors,
        search_queries: metadata.web_search_queries,
        citations,
    }
}

#[async_trait]
impl GroundedSearch for GeminiGroundedSearch {
    async fn search(
        &self,
        domain: &str,
        query: &str,
        max_results: usize,
    ) -> Result<CompetitorResult> {
        let Some(api_key) = &self.api_key else {
            return Err(SurveyError::NotConfigured(
                "grounded search API key is not set".to_string(),
            ));
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(domain, query, max_results))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SurveyError::Fetch {
                url,
                message: format!("grounded search returned HTTP {}", status.as_u16()),
            });
        }

        let body: GenerateResponse = response.json().await?;
        Ok(into_result(body, max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_into_result() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "```json\n{\"competitors\": [{\"name\": \" Rival \", \"url\": \"https://rival.io\", "},
                    {"text": "\"description\": \"Roasts beans\", \"relevance\": \"Same market\"}, {\"name\": \"\"}]}\n```"}
                ]},
                "groundingMetadata": {
                    "webSearchQueries": ["coffee roasters berlin"],
                    "groundingChunks": [
                        {"web": {"uri": "https://source.example/a", "title": "Source A"}},
                        {"retrievedContext": {}}
                    ]
                }
            }]
        }))
        .unwrap();

        let result = into_result(response, 10);
        assert_eq!(result.competitors.len(), 1);
        assert_eq!(result.competitors[0].name, "Rival");
        assert_eq!(result.competitors[0].relevance, "Same market");
        assert_eq!(result.search_queries, vec!["coffee roasters berlin"]);
        assert_eq!(
            result.citations,
            vec![Citation {
                title: "Source A".to_string(),
                url: "https://source.example/a".to_string()
            }]
        );
    }

    #[test]
    fn test_into_result_unparsable_answer() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "Sorry, I cannot help."}]}}]
        }))
        .unwrap();
        assert!(into_result(response, 10).competitors.is_empty());
        assert_eq!(
            into_result(GenerateResponse::default(), 10),
            CompetitorResult::default()
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let search = GeminiGroundedSearch::new(
            Client::new(),
            "https://generativelanguage.googleapis.com/v1beta",
            "gemini-2.5-flash",
            None,
        );
        let err = search.search("example.com", "coffee", 5).await.unwrap_err();
        assert!(err.is_not_configured());
    }
}
