//! Reddit data acquisition over the public `.json` listing endpoints.
//!
//! The listing shape is fragile upstream, so parsing works over raw
//! `serde_json::Value`s and tolerates missing fields per child. Neither the
//! search ordering nor the comment ordering coming back from Reddit is
//! trusted; both are re-sorted by score locally.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use daybrief_common::{RedditComment, RedditPost, RedditResult};
use scrapingfish_client::{ScrapingFishClient, ScrapingFishError};

/// Cap on persisted free-text fields (self-text, comment bodies).
const MAX_TEXT_LEN: usize = 500;

/// Extra search results requested beyond the target count, to survive
/// drop-outs in later stages.
const SEARCH_OVERFETCH: usize = 10;

/// Courtesy delay before each comment fetch within one keyword.
const COMMENT_FETCH_DELAY: Duration = Duration::from_millis(500);

/// Backoff before the single retry on a rate-limited comment fetch.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

const REDDIT_USER_AGENT: &str = "rust:daybrief:v0.1 (by /u/daybrief_digest)";

// --- Transport ---

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, TransportError::Status(429))
    }
}

impl From<ScrapingFishError> for TransportError {
    fn from(err: ScrapingFishError) -> Self {
        match err {
            ScrapingFishError::Api { status, .. } => TransportError::Status(status),
            other => TransportError::Other(other.to_string()),
        }
    }
}

/// How a Reddit `.json` URL is fetched. The strategies behave identically;
/// only the path the request takes differs.
#[async_trait]
pub trait RedditTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError>;
    fn name(&self) -> &str;
}

/// Fetches through the ScrapingFish proxy.
pub struct ProxyTransport {
    client: ScrapingFishClient,
}

impl ProxyTransport {
    pub fn new(client: ScrapingFishClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RedditTransport for ProxyTransport {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        Ok(self.client.fetch_json(url).await?)
    }

    fn name(&self) -> &str {
        "proxy"
    }
}

/// Fetches Reddit directly with a fixed User-Agent.
pub struct DirectTransport {
    client: reqwest::Client,
}

impl DirectTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(REDDIT_USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for DirectTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedditTransport for DirectTransport {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        resp.json()
            .await
            .map_err(|e| TransportError::Other(format!("Invalid JSON in response: {e}")))
    }

    fn name(&self) -> &str {
        "direct"
    }
}

// --- Client ---

pub struct RedditClient {
    transport: Box<dyn RedditTransport>,
    comment_fetch_delay: Duration,
    rate_limit_backoff: Duration,
}

impl RedditClient {
    pub fn new(transport: Box<dyn RedditTransport>) -> Self {
        info!(transport = transport.name(), "Using Reddit transport");
        Self {
            transport,
            comment_fetch_delay: COMMENT_FETCH_DELAY,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }

    #[cfg(test)]
    fn without_delays(mut self) -> Self {
        self.comment_fetch_delay = Duration::ZERO;
        self.rate_limit_backoff = Duration::ZERO;
        self
    }

    /// Fetch the top posts for a keyword together with each post's top
    /// comments. Upstream failure of any kind yields a shorter (possibly
    /// empty) list, never an error.
    pub async fn top_posts_with_comments(
        &self,
        keyword: &str,
        subreddit: Option<&str>,
        num_posts: usize,
        num_comments: usize,
        time_filter: &str,
    ) -> Vec<RedditResult> {
        info!(
            keyword,
            subreddit = subreddit.unwrap_or("all"),
            num_posts,
            time_filter,
            "Processing Reddit keyword"
        );

        let url = search_url(keyword, subreddit, num_posts + SEARCH_OVERFETCH, time_filter);
        let data = match self.transport.get_json(&url).await {
            Ok(data) => data,
            Err(e) => {
                warn!(keyword, error = %e, "Reddit search failed");
                return Vec::new();
            }
        };

        let posts = parse_search_listing(&data, num_posts);

        if posts.is_empty() {
            // A search hit without a usable permalink still carries signal;
            // degrade to a snippet-only record rather than dropping the
            // keyword silently.
            if let Some(post) = degraded_post(&data) {
                warn!(keyword, "No usable posts parsed, degrading to search snippet");
                return vec![RedditResult {
                    keyword: keyword.to_string(),
                    subreddit_filter: subreddit.map(String::from),
                    post,
                    comments: Vec::new(),
                }];
            }
            warn!(keyword, "No Reddit results");
            return Vec::new();
        }

        info!(keyword, count = posts.len(), "Found top Reddit posts");

        let mut results = Vec::new();
        for post in posts {
            tokio::time::sleep(self.comment_fetch_delay).await;

            let comments = match self.fetch_comments(&post.url, num_comments).await {
                Ok(comments) => comments,
                Err(e) => {
                    warn!(url = post.url.as_str(), error = %e, "Failed to fetch comments");
                    Vec::new()
                }
            };

            info!(
                title = post.title.as_str(),
                score = post.score,
                comments = comments.len(),
                "Got post"
            );

            results.push(RedditResult {
                keyword: keyword.to_string(),
                subreddit_filter: subreddit.map(String::from),
                post,
                comments,
            });
        }

        info!(keyword, count = results.len(), "Reddit keyword complete");
        results
    }

    /// Legacy single-post mode: the top post for a keyword, or `None`.
    pub async fn top_post_with_comments(
        &self,
        keyword: &str,
        subreddit: Option<&str>,
        num_comments: usize,
    ) -> Option<RedditResult> {
        self.top_posts_with_comments(keyword, subreddit, 1, num_comments, "day")
            .await
            .into_iter()
            .next()
    }

    /// Fetch one post and its top comments directly by URL.
    pub async fn post_by_url(
        &self,
        post_url: &str,
        num_comments: usize,
    ) -> Option<(RedditPost, Vec<RedditComment>)> {
        let json_url = listing_url(post_url);
        info!(url = post_url, "Fetching post");

        let data = match self.transport.get_json(&json_url).await {
            Ok(data) => data,
            Err(e) => {
                warn!(url = post_url, error = %e, "Failed to fetch post");
                return None;
            }
        };

        let mut post = parse_post_listing(&data)?;
        post.url = post_url.to_string();

        let comments = parse_comment_listing(&data, num_comments);
        info!(
            title = post.title.as_str(),
            score = post.score,
            comments = comments.len(),
            "Fetched post"
        );
        Some((post, comments))
    }

    /// Fetch a post's top-level comments, tolerating one 429 with a fixed
    /// backoff before giving up.
    async fn fetch_comments(
        &self,
        post_url: &str,
        num_comments: usize,
    ) -> Result<Vec<RedditComment>, TransportError> {
        let json_url = listing_url(post_url);
        info!(url = post_url, "Fetching comments");

        let data = match self.transport.get_json(&json_url).await {
            Ok(data) => data,
            Err(e) if e.is_rate_limited() => {
                warn!(url = post_url, "Rate limited, retrying once");
                tokio::time::sleep(self.rate_limit_backoff).await;
                self.transport.get_json(&json_url).await?
            }
            Err(e) => return Err(e),
        };

        Ok(parse_comment_listing(&data, num_comments))
    }
}

// --- URL building ---

fn search_url(keyword: &str, subreddit: Option<&str>, limit: usize, time_filter: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();

    match subreddit {
        Some(sub) => format!(
            "https://www.reddit.com/r/{sub}/search.json?q={encoded}&restrict_sr=on&sort=relevance&t={time_filter}&type=link&limit={limit}"
        ),
        None => format!(
            "https://www.reddit.com/search.json?q={encoded}&sort=relevance&t={time_filter}&type=link&limit={limit}"
        ),
    }
}

fn listing_url(post_url: &str) -> String {
    format!("{}.json", post_url.trim_end_matches('/'))
}

// --- Listing parsing ---

fn str_field(data: &Value, key: &str) -> String {
    data.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Truncate to at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Parse a search listing into posts. Children without a permalink are
/// skipped. Posts are re-sorted by score descending and truncated to `limit`.
pub(crate) fn parse_search_listing(data: &Value, limit: usize) -> Vec<RedditPost> {
    let Some(children) = data.pointer("/data/children").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut posts = Vec::new();
    for child in children {
        let Some(post) = child.get("data") else { continue };
        let permalink = str_field(post, "permalink");
        if permalink.is_empty() {
            continue;
        }

        posts.push(RedditPost {
            title: str_field(post, "title"),
            url: format!("https://www.reddit.com{permalink}"),
            score: post.get("score").and_then(Value::as_i64).unwrap_or(0),
            num_comments: post.get("num_comments").and_then(Value::as_u64).unwrap_or(0),
            subreddit: str_field(post, "subreddit"),
            selftext: truncate_chars(&str_field(post, "selftext"), MAX_TEXT_LEN),
        });
    }

    posts.sort_by(|a, b| b.score.cmp(&a.score));
    posts.truncate(limit);
    posts
}

/// Parse the post entry from a `<post-url>.json` response (a two-element
/// array whose first listing holds the post itself).
pub(crate) fn parse_post_listing(data: &Value) -> Option<RedditPost> {
    let post = data.get(0)?.pointer("/data/children/0/data")?;

    Some(RedditPost {
        title: str_field(post, "title"),
        url: str_field(post, "url"),
        score: post.get("score").and_then(Value::as_i64).unwrap_or(0),
        num_comments: post.get("num_comments").and_then(Value::as_u64).unwrap_or(0),
        subreddit: str_field(post, "subreddit"),
        selftext: truncate_chars(&str_field(post, "selftext"), MAX_TEXT_LEN),
    })
}

/// Parse top-level comments from a `<post-url>.json` response. Only `t1`
/// children are comments; everything else ("more" stubs, the post itself) is
/// skipped. Output is sorted by score descending and truncated to `limit`.
pub(crate) fn parse_comment_listing(data: &Value, limit: usize) -> Vec<RedditComment> {
    let Some(children) = data
        .get(1)
        .and_then(|listing| listing.pointer("/data/children"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut comments = Vec::new();
    for child in children {
        if child.get("kind").and_then(Value::as_str) != Some("t1") {
            continue;
        }
        let Some(comment) = child.get("data") else { continue };

        let author = match comment.get("author").and_then(Value::as_str) {
            Some(author) if !author.is_empty() => author.to_string(),
            _ => "[deleted]".to_string(),
        };

        comments.push(RedditComment {
            author,
            score: comment.get("score").and_then(Value::as_i64).unwrap_or(0),
            body: truncate_chars(&str_field(comment, "body"), MAX_TEXT_LEN),
        });
    }

    comments.sort_by(|a, b| b.score.cmp(&a.score));
    comments.truncate(limit);
    comments
}

/// Build a degraded snippet-only record from the first search child that has
/// a title. Used when no child parsed into a full post.
fn degraded_post(data: &Value) -> Option<RedditPost> {
    let children = data.pointer("/data/children").and_then(Value::as_array)?;

    children.iter().find_map(|child| {
        let post = child.get("data")?;
        let title = post.get("title").and_then(Value::as_str)?;
        if title.is_empty() {
            return None;
        }

        Some(RedditPost {
            title: title.to_string(),
            url: str_field(post, "url"),
            score: 0,
            num_comments: 0,
            subreddit: str_field(post, "subreddit"),
            selftext: truncate_chars(&str_field(post, "selftext"), MAX_TEXT_LEN),
        })
    })
}
