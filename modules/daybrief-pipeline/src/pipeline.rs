use anyhow::Result;
use tracing::{error, info, warn};

use daybrief_common::{DigestConfig, PageSummary, RedditResult};
use resend_client::{ResendClient, SendEmailRequest};

use crate::assemble::assemble_email;
use crate::compose::SectionComposer;
use crate::reddit::RedditClient;
use crate::relevance::RelevanceFilter;
use crate::review::ReviewLoop;
use crate::scrape::ContentFetcher;
use crate::search::WebSearcher;
use crate::summarize::Summarizer;

/// Everything the pipeline needs, constructed once in `main` and passed down
/// explicitly. No stage reaches for process-wide state.
pub struct Deps {
    pub searcher: Box<dyn WebSearcher>,
    pub relevance: RelevanceFilter,
    pub fetcher: ContentFetcher,
    pub summarizer: Summarizer,
    pub reddit: RedditClient,
    pub composer: SectionComposer,
    /// When set, composition runs through the draft/review loop instead of
    /// per-section rendering.
    pub review: Option<ReviewLoop>,
    pub mailer: ResendClient,
}

pub struct RunOptions {
    pub quick: bool,
    pub dry_run: bool,
    /// Cap on results kept per topic after relevance filtering.
    pub max_results: usize,
    pub destination: String,
}

pub struct Pipeline {
    deps: Deps,
}

impl Pipeline {
    pub fn new(deps: Deps) -> Self {
        Self { deps }
    }

    /// Run the whole digest: topics, Reddit keywords, composition, delivery.
    /// Returns the final HTML.
    pub async fn run(&self, digest: &DigestConfig, opts: &RunOptions) -> Result<String> {
        let summaries_by_topic = self.collect_topic_summaries(digest, opts).await?;
        let reddit_data = self.collect_reddit_data(digest, opts).await;

        let date = chrono::Local::now().format("%Y-%m-%d").to_string();

        let html = match &self.deps.review {
            Some(review) => {
                let all_summaries: Vec<PageSummary> = summaries_by_topic
                    .iter()
                    .flat_map(|(_, summaries)| summaries.iter().cloned())
                    .collect();
                review.run(&all_summaries, &reddit_data, &date).await?
            }
            None => {
                let mut topic_sections = Vec::new();
                for (category, summaries) in &summaries_by_topic {
                    match self.deps.composer.topic_section(category, summaries).await {
                        Ok(section) => topic_sections.push(section),
                        Err(e) => {
                            warn!(category = category.as_str(), error = %e, "Failed to compose topic section");
                        }
                    }
                }

                let mut reddit_sections = Vec::new();
                for item in &reddit_data {
                    match self.deps.composer.reddit_section(item).await {
                        Ok(section) => reddit_sections.push(section),
                        Err(e) => {
                            warn!(keyword = item.keyword.as_str(), error = %e, "Failed to compose Reddit section");
                        }
                    }
                }

                assemble_email(&topic_sections, &reddit_sections, &date)
            }
        };

        info!(bytes = html.len(), "Generated email");

        if opts.dry_run {
            info!("Dry run, not sending");
            println!("{html}");
        } else {
            self.deliver(&html, &date, opts).await;
        }

        Ok(html)
    }

    /// Search, filter, scrape, and summarize every configured topic.
    /// A failure anywhere in one topic's chain drops that topic and moves on.
    async fn collect_topic_summaries(
        &self,
        digest: &DigestConfig,
        opts: &RunOptions,
    ) -> Result<Vec<(String, Vec<PageSummary>)>> {
        let num_results = if opts.quick { 5 } else { 10 };
        let mut by_topic: Vec<(String, Vec<PageSummary>)> = Vec::new();

        for topic in &digest.topics {
            info!(
                term = topic.term.as_str(),
                category = topic.category.as_str(),
                "Processing topic"
            );

            let mut results = match self.deps.searcher.search(&topic.term, num_results).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(term = topic.term.as_str(), error = %e, "Search failed for topic");
                    continue;
                }
            };
            for result in &mut results {
                result.category = topic.category.clone();
            }

            let relevant = match self.deps.relevance.filter(&results, opts.max_results).await {
                Ok(relevant) => relevant,
                Err(e) => {
                    warn!(term = topic.term.as_str(), error = %e, "Relevance filter failed for topic");
                    continue;
                }
            };
            if relevant.is_empty() {
                continue;
            }

            let pages = self.deps.fetcher.fetch_pages(&relevant).await?;
            let summaries = self.deps.summarizer.summarize_pages(&pages).await?;

            match by_topic.iter_mut().find(|(category, _)| *category == topic.category) {
                Some((_, existing)) => existing.extend(summaries),
                None => by_topic.push((topic.category.clone(), summaries)),
            }
        }

        info!(topics = by_topic.len(), "Processed topics");
        Ok(by_topic)
    }

    /// One top post with comments per configured keyword (legacy single-post
    /// mode). Keywords that produce nothing are logged and skipped.
    async fn collect_reddit_data(
        &self,
        digest: &DigestConfig,
        opts: &RunOptions,
    ) -> Vec<RedditResult> {
        let num_comments = if opts.quick { 3 } else { 5 };
        let mut reddit_data = Vec::new();

        for item in &digest.reddit_keywords {
            match self
                .deps
                .reddit
                .top_post_with_comments(&item.keyword, item.subreddit.as_deref(), num_comments)
                .await
            {
                Some(result) => reddit_data.push(result),
                None => warn!(keyword = item.keyword.as_str(), "No Reddit result for keyword"),
            }
        }

        info!(count = reddit_data.len(), "Fetched Reddit keyword data");
        reddit_data
    }

    /// Uniform policy: a delivery failure is logged, never fatal.
    async fn deliver(&self, html: &str, date: &str, opts: &RunOptions) {
        info!("Sending email via Resend");

        let request = SendEmailRequest {
            from: "Daybrief <onboarding@resend.dev>".to_string(),
            to: vec![opts.destination.clone()],
            subject: format!("Daybrief Daily Digest - {date}"),
            html: html.to_string(),
        };

        match self.deps.mailer.send(&request).await {
            Ok(sent) => info!(id = %sent.id, "Email sent"),
            Err(e) => error!(error = %e, "Failed to send email"),
        }
    }
}
