use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Credentials and switches loaded from environment variables.
/// Loaded in `main` before any network call; a missing required value aborts
/// the run with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    pub serper_api_key: String,
    pub scrapingfish_api_key: String,
    pub openai_api_key: String,
    pub resend_api_key: String,
    pub destination_email: String,
    pub reddit_fetch_mode: RedditFetchMode,
}

/// How Reddit's JSON endpoints are reached. The strategies behave
/// identically; only the transport differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedditFetchMode {
    /// Through the ScrapingFish proxy (default).
    Proxy,
    /// Plain HTTP with a fixed User-Agent.
    Direct,
}

impl Config {
    pub fn from_env() -> Self {
        let reddit_fetch_mode = match env::var("REDDIT_FETCH_MODE").as_deref() {
            Ok("direct") => RedditFetchMode::Direct,
            Ok("proxy") | Err(_) => RedditFetchMode::Proxy,
            Ok(other) => panic!("REDDIT_FETCH_MODE must be \"proxy\" or \"direct\", got \"{other}\""),
        };

        Self {
            serper_api_key: required_env("SERPER_API_KEY"),
            scrapingfish_api_key: required_env("SCRAPINGFISH_API_KEY"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            resend_api_key: required_env("RESEND_API_KEY"),
            destination_email: required_env("DESTINATION_EMAIL"),
            reddit_fetch_mode,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Topic and Reddit keyword lists, loaded from a JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    pub topics: Vec<Topic>,
    pub reddit_keywords: Vec<RedditKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topic {
    pub term: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditKeyword {
    pub keyword: String,
    #[serde(default)]
    pub subreddit: Option<String>,
}

impl DigestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read digest config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid digest config {}", path.display()))
    }

    /// One topic and one keyword, for quick test runs.
    pub fn quick(&self) -> Self {
        Self {
            topics: self.topics.iter().take(1).cloned().collect(),
            reddit_keywords: self.reddit_keywords.iter().take(1).cloned().collect(),
        }
    }
}
