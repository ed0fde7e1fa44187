use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use daybrief_common::SearchResult;

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

// --- WebSearcher trait ---

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>>;
}

// --- Serper (Google Search) ---

pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperHit>,
}

#[derive(Debug, serde::Deserialize)]
struct SerperHit {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: SERPER_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        info!(query, num_results, "Serper search");

        let body = serde_json::json!({
            "q": query,
            "gl": "gb",
            "num": num_results,
            // restrict to results from the past day
            "tbs": "qdr:d",
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Serper API request failed")?;

        let data: SerperResponse = resp
            .json()
            .await
            .context("Failed to parse Serper response")?;

        if data.organic.is_empty() {
            warn!(query, "No organic results");
            return Ok(Vec::new());
        }

        let results = into_results(data.organic, query);
        info!(query, count = results.len(), "Serper search complete");
        Ok(results)
    }
}

/// Assign per-run ids 1..N in upstream rank order. The category is left blank
/// for the caller to attach.
fn into_results(hits: Vec<SerperHit>, query: &str) -> Vec<SearchResult> {
    hits.into_iter()
        .enumerate()
        .map(|(idx, hit)| SearchResult {
            id: idx as u32 + 1,
            title: hit.title,
            link: hit.link,
            snippet: hit.snippet,
            term: query.to_string(),
            category: String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hits(n: usize) -> Vec<SerperHit> {
        (0..n)
            .map(|i| SerperHit {
                link: format!("https://example.test/{i}"),
                title: format!("Article {i}"),
                snippet: format!("Snippet {i}"),
            })
            .collect()
    }

    #[test]
    fn ids_are_sequential_from_one_in_rank_order() {
        let results = into_results(hits(5), "agentic AI");
        let ids: Vec<u32> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(results[0].title, "Article 0");
        assert_eq!(results[0].term, "agentic AI");
    }

    #[test]
    fn ids_are_unique_within_a_call() {
        let results = into_results(hits(10), "q");
        let unique: HashSet<u32> = results.iter().map(|r| r.id).collect();
        assert_eq!(unique.len(), results.len());
    }

    #[tokio::test]
    async fn missing_organic_field_yields_empty_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"searchParameters": {}}"#),
            )
            .mount(&server)
            .await;

        let searcher = SerperSearcher::new("serper-key").with_endpoint(&server.uri());
        let results = searcher.search("obscure query", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn api_key_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-API-KEY", "serper-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic": [
                    {"title": "T", "link": "https://a.test", "snippet": "S"}
                ]
            })))
            .mount(&server)
            .await;

        let searcher = SerperSearcher::new("serper-key").with_endpoint(&server.uri());
        let results = searcher.search("q", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
    }
}
