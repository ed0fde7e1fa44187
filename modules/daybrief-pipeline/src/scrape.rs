use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use daybrief_common::{ScrapedPage, SearchResult};
use scrapingfish_client::ScrapingFishClient;

use crate::markdown::html_to_markdown;

// --- PageScraper trait ---

#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Fetch rendered HTML for a URL.
    async fn fetch_html(&self, url: &str) -> Result<String>;
    fn name(&self) -> &str;
}

// --- ScrapingFish scraper ---

pub struct ScrapingFishScraper {
    client: ScrapingFishClient,
}

impl ScrapingFishScraper {
    pub fn new(client: ScrapingFishClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageScraper for ScrapingFishScraper {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.client
            .fetch(url, true)
            .await
            .context("ScrapingFish content request failed")
    }

    fn name(&self) -> &str {
        "scrapingfish"
    }
}

// --- Content fetcher ---

/// Scrapes each relevant result, normalizes it to markdown, and persists one
/// file per result id. A failure on one item drops that item and the batch
/// continues.
pub struct ContentFetcher {
    scraper: Box<dyn PageScraper>,
    output_dir: PathBuf,
}

impl ContentFetcher {
    pub fn new(scraper: Box<dyn PageScraper>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            scraper,
            output_dir: output_dir.into(),
        }
    }

    pub async fn fetch_pages(&self, results: &[SearchResult]) -> Result<Vec<ScrapedPage>> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create {}", self.output_dir.display())
        })?;

        let mut pages = Vec::new();

        for (i, result) in results.iter().enumerate() {
            info!(
                n = i + 1,
                total = results.len(),
                url = result.link.as_str(),
                scraper = self.scraper.name(),
                "Scraping URL"
            );

            let html = match self.scraper.fetch_html(&result.link).await {
                Ok(html) if !html.trim().is_empty() => html,
                Ok(_) => {
                    warn!(url = result.link.as_str(), "Empty response body");
                    continue;
                }
                Err(e) => {
                    warn!(url = result.link.as_str(), error = %e, "Failed to scrape");
                    continue;
                }
            };

            let markdown = html_to_markdown(&html);

            let path = self.output_dir.join(format!("{}.md", result.id));
            if let Err(e) = std::fs::write(&path, &markdown) {
                warn!(path = %path.display(), error = %e, "Failed to persist scraped page");
                continue;
            }

            pages.push(ScrapedPage {
                id: result.id,
                url: result.link.clone(),
                title: result.title.clone(),
                markdown,
                category: result.category.clone(),
            });
        }

        info!(scraped = pages.len(), of = results.len(), "Scrape batch complete");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn result(id: u32, link: &str) -> SearchResult {
        SearchResult {
            id,
            title: format!("Article {id}"),
            link: link.to_string(),
            snippet: String::new(),
            term: "q".to_string(),
            category: "General".to_string(),
        }
    }

    fn fetcher_for(server: &MockServer, dir: &std::path::Path) -> ContentFetcher {
        let client = ScrapingFishClient::new("fish-key").with_api_url(&server.uri());
        ContentFetcher::new(Box::new(ScrapingFishScraper::new(client)), dir)
    }

    #[tokio::test]
    async fn failed_scrape_drops_item_and_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("url", "https://a.test"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("url", "https://b.test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>B</h1>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher_for(&server, dir.path());

        let pages = fetcher
            .fetch_pages(&[result(1, "https://a.test"), result(2, "https://b.test")])
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, 2);
        assert_eq!(pages[0].markdown, "# B");
    }

    #[tokio::test]
    async fn pages_are_persisted_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>body</p>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher_for(&server, dir.path());

        let pages = fetcher
            .fetch_pages(&[result(7, "https://a.test")])
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        let persisted = std::fs::read_to_string(dir.path().join("7.md")).unwrap();
        assert_eq!(persisted, "body");
    }

    #[tokio::test]
    async fn output_dir_creation_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>x</p>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher_for(&server, dir.path());

        fetcher.fetch_pages(&[result(1, "https://a.test")]).await.unwrap();
        fetcher.fetch_pages(&[result(2, "https://a.test")]).await.unwrap();

        assert!(dir.path().join("1.md").exists());
        assert!(dir.path().join("2.md").exists());
    }
}
