//! Diagnostic tool: fetch one Reddit post with its top comments by URL and
//! print the parsed record as JSON.
//!
//! Usage: cargo run --bin inspect_post -- <post-url> [num-comments]
//!
//! Uses the ScrapingFish proxy when SCRAPINGFISH_API_KEY is set, otherwise
//! fetches Reddit directly.

use anyhow::{anyhow, Result};

use daybrief_pipeline::reddit::{
    DirectTransport, ProxyTransport, RedditClient, RedditTransport,
};
use scrapingfish_client::ScrapingFishClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let post_url = args
        .next()
        .ok_or_else(|| anyhow!("Usage: inspect_post <post-url> [num-comments]"))?;
    let num_comments: usize = args.next().map(|n| n.parse()).transpose()?.unwrap_or(10);

    let transport: Box<dyn RedditTransport> = match std::env::var("SCRAPINGFISH_API_KEY") {
        Ok(key) => Box::new(ProxyTransport::new(ScrapingFishClient::new(&key))),
        Err(_) => Box::new(DirectTransport::new()),
    };
    let client = RedditClient::new(transport);

    match client.post_by_url(&post_url, num_comments).await {
        Some((post, comments)) => {
            let record = serde_json::json!({ "post": post, "comments": comments });
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => Err(anyhow!("No post data for {post_url}")),
    }
}
