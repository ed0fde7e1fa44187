use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use ai_client::OpenAi;
use daybrief_common::{PageSummary, ScrapedPage};

use crate::prompts;

/// Word budget for the content sent to the summary model. Bounds prompt cost
/// and latency on very long pages.
const SUMMARY_WORD_BUDGET: usize = 2000;

pub struct Summarizer {
    model: OpenAi,
    output_dir: PathBuf,
}

impl Summarizer {
    pub fn new(model: OpenAi, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model,
            output_dir: output_dir.into(),
        }
    }

    /// Summarize each scraped page and persist the raw summary text. Any
    /// failure (model call, file write) drops that page and the batch
    /// continues.
    pub async fn summarize_pages(&self, pages: &[ScrapedPage]) -> Result<Vec<PageSummary>> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create {}", self.output_dir.display())
        })?;

        let system = prompts::load("summarise_markdown_page")?;
        let mut summaries = Vec::new();

        for (i, page) in pages.iter().enumerate() {
            info!(
                n = i + 1,
                total = pages.len(),
                title = page.title.as_str(),
                "Summarizing page"
            );

            let input = truncate_words(&page.markdown, SUMMARY_WORD_BUDGET);

            let outcome = async {
                let summary = self.model.chat(&system, &input).await?;

                let path = self.output_dir.join(format!("summary_{}.md", page.id));
                std::fs::write(&path, &summary)
                    .with_context(|| format!("Failed to persist {}", path.display()))?;

                Ok::<String, anyhow::Error>(summary)
            }
            .await;

            match outcome {
                Ok(summary) => summaries.push(PageSummary {
                    summary,
                    url: page.url.clone(),
                    title: page.title.clone(),
                    category: page.category.clone(),
                }),
                Err(e) => {
                    warn!(url = page.url.as_str(), error = %e, "Failed to summarize page");
                }
            }
        }

        info!(summarized = summaries.len(), of = pages.len(), "Summary batch complete");
        Ok(summaries)
    }
}

/// First `max` whitespace-delimited tokens of `text`.
pub fn truncate_words(text: &str, max: usize) -> String {
    text.split_whitespace().take(max).collect::<Vec<_>>().join(" ")
}
