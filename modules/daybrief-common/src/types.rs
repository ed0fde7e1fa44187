use serde::{Deserialize, Serialize};

/// One web search hit, enriched by the caller with its topic category.
///
/// Ids are assigned 1..N in upstream rank order and are unique within a
/// single search call. The relevance filter selects results by echoing these
/// ids back as strings; see `select_relevant` for the equality contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u32,
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Query term that produced this result.
    pub term: String,
    /// Topic category, attached by the caller after the search.
    pub category: String,
}

/// A fetched page after markdown normalization. Persisted to disk once for
/// auditability; the pipeline never reads the file back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub id: u32,
    pub url: String,
    pub title: String,
    pub markdown: String,
    pub category: String,
}

/// An LLM summary of one scraped page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub summary: String,
    pub url: String,
    pub title: String,
    pub category: String,
}

/// A Reddit post as parsed from the public listing JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPost {
    pub title: String,
    pub url: String,
    /// Net vote score; can go negative.
    pub score: i64,
    pub num_comments: u64,
    pub subreddit: String,
    /// Self-text, truncated to keep prompt sizes bounded.
    pub selftext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditComment {
    pub author: String,
    pub score: i64,
    /// Comment body, truncated to keep prompt sizes bounded.
    pub body: String,
}

/// One keyword's digest material: a post plus its top comments, sorted
/// descending by score and bounded by the requested comment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditResult {
    pub keyword: String,
    pub subreddit_filter: Option<String>,
    pub post: RedditPost,
    pub comments: Vec<RedditComment>,
}
