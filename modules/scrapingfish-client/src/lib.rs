pub mod error;

pub use error::{Result, ScrapingFishError};

use std::time::Duration;

const API_URL: &str = "https://scraping.narf.ai/api/v1/";

pub struct ScrapingFishClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl ScrapingFishClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            api_url: API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// Fetch a page through the proxy. `render_js` runs the target through a
    /// headless browser before the HTML is returned.
    pub async fn fetch(&self, url: &str, render_js: bool) -> Result<String> {
        let mut params = vec![("api_key", self.api_key.as_str()), ("url", url)];
        if render_js {
            params.push(("render_js", "true"));
        }

        let resp = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ScrapingFishError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }

    /// Fetch a target that serves JSON (e.g. Reddit listing endpoints) through
    /// the proxy and parse the body.
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let body = self.fetch(url, false).await?;
        serde_json::from_str(&body).map_err(|e| ScrapingFishError::Json(e.to_string()))
    }
}
