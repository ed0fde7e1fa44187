pub mod config;
pub mod types;

pub use config::{Config, DigestConfig, RedditFetchMode, RedditKeyword, Topic};
pub use types::{
    PageSummary, RedditComment, RedditPost, RedditResult, ScrapedPage, SearchResult,
};
