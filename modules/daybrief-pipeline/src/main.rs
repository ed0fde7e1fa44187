use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use daybrief_common::{Config, DigestConfig, RedditFetchMode};
use daybrief_pipeline::compose::SectionComposer;
use daybrief_pipeline::pipeline::{Deps, Pipeline, RunOptions};
use daybrief_pipeline::reddit::{
    DirectTransport, ProxyTransport, RedditClient, RedditTransport,
};
use daybrief_pipeline::relevance::RelevanceFilter;
use daybrief_pipeline::review::{OpenAiDraftModel, ReviewLoop};
use daybrief_pipeline::scrape::{ContentFetcher, ScrapingFishScraper};
use daybrief_pipeline::search::SerperSearcher;
use daybrief_pipeline::summarize::Summarizer;
use resend_client::ResendClient;
use scrapingfish_client::ScrapingFishClient;

const MODEL: &str = "gpt-4o-mini";
const SCRAPED_DIR: &str = "scraped_markdown";
const SUMMARIES_DIR: &str = "markdown_summaries";

#[derive(Parser, Debug)]
#[command(name = "daybrief", about = "Generate and send the daily digest email")]
struct Cli {
    /// Quick test mode: one topic and one Reddit keyword.
    #[arg(long)]
    quick: bool,

    /// Generate the email but print it instead of sending.
    #[arg(long)]
    dry_run: bool,

    /// Maximum results kept per topic after relevance filtering.
    #[arg(long, default_value_t = 3)]
    max_results: usize,

    /// Compose through the draft/review revision loop instead of
    /// per-section rendering.
    #[arg(long)]
    review: bool,

    /// Maximum draft/review rounds before the last draft is accepted.
    #[arg(long, default_value_t = 3)]
    review_rounds: usize,

    /// Path to the topics/keywords config file.
    #[arg(long, default_value = "digest.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("daybrief=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!(quick = cli.quick, dry_run = cli.dry_run, review = cli.review, "Daybrief starting");

    // Credentials are validated here, before any network call.
    let config = Config::from_env();

    let digest = DigestConfig::load(&cli.config)?;
    let digest = if cli.quick { digest.quick() } else { digest };
    info!(
        topics = digest.topics.len(),
        keywords = digest.reddit_keywords.len(),
        "Loaded digest config"
    );

    let opts = RunOptions {
        quick: cli.quick,
        dry_run: cli.dry_run,
        max_results: cli.max_results,
        destination: config.destination_email.clone(),
    };

    let pipeline = Pipeline::new(build_deps(&config, &cli));
    pipeline.run(&digest, &opts).await?;

    info!("Daybrief run complete");
    Ok(())
}

fn build_deps(config: &Config, cli: &Cli) -> Deps {
    let model = OpenAi::new(&config.openai_api_key, MODEL);

    let transport: Box<dyn RedditTransport> = match config.reddit_fetch_mode {
        RedditFetchMode::Proxy => Box::new(ProxyTransport::new(ScrapingFishClient::new(
            &config.scrapingfish_api_key,
        ))),
        RedditFetchMode::Direct => Box::new(DirectTransport::new()),
    };

    let scraper = ScrapingFishScraper::new(ScrapingFishClient::new(&config.scrapingfish_api_key));

    Deps {
        searcher: Box::new(SerperSearcher::new(&config.serper_api_key)),
        relevance: RelevanceFilter::new(model.clone()),
        fetcher: ContentFetcher::new(Box::new(scraper), SCRAPED_DIR),
        summarizer: Summarizer::new(model.clone(), SUMMARIES_DIR),
        reddit: RedditClient::new(transport),
        composer: SectionComposer::new(model.clone()),
        review: cli.review.then(|| {
            ReviewLoop::new(
                Box::new(OpenAiDraftModel::new(model.clone())),
                cli.review_rounds,
            )
        }),
        mailer: ResendClient::new(&config.resend_api_key),
    }
}
