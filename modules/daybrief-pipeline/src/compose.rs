use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use ai_client::OpenAi;
use daybrief_common::{PageSummary, RedditResult};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TopicSectionOutput {
    /// HTML section for this topic.
    pub html_section: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RedditSectionOutput {
    /// HTML section for this Reddit keyword.
    pub html_section: String,
}

const TOPIC_SECTION_PROMPT: &str = r#"You are generating ONE section of an email digest for the topic: {topic_name}

Given the article summaries in the next message, create an HTML section following this exact format:

<h2><b>{topic_name}</b></h2>
<ul>
  <li><b><a href="URL">Article Title</a></b> - 2-3 sentence summary of the key insight.</li>
</ul>
<p><b>Takeaway:</b> <i>1-2 sentence synthesis of what these articles mean together.</i></p>

<hr>

Rules:
- Every article MUST have a clickable link using the URL provided
- Keep summaries concise (2-3 sentences max)
- The takeaway should synthesize the articles, not just repeat them
- Output ONLY the HTML section, nothing else"#;

const REDDIT_SECTION_PROMPT: &str = r#"You are generating ONE section of an email digest for Reddit keyword: "{keyword}"

Given the Reddit post data in the next message, create an HTML section following this exact format:

<h2>Keyword: "{keyword}"</h2>
<p><b><a href="REDDIT_URL">Post Title</a></b> | [X] upvotes | [Y] comments | r/[subreddit]</p>
<blockquote>Brief 2-sentence summary of what the post is about.</blockquote>
<p><b>Top Comments:</b></p>
<ol>
  <li><b>u/[author]</b> ([score]): "[Comment excerpt, max 100 chars]..."</li>
</ol>

<hr>

Rules:
- Use the exact URL, title, score, and subreddit from the input
- Keep comment excerpts to max 100 characters, end with "..." if truncated
- Include up to 5 top comments
- Output ONLY the HTML section, nothing else"#;

pub struct SectionComposer {
    model: OpenAi,
}

impl SectionComposer {
    pub fn new(model: OpenAi) -> Self {
        Self { model }
    }

    /// Render one topic's roundup fragment. Empty input short-circuits to an
    /// empty fragment without a model call.
    pub async fn topic_section(
        &self,
        category: &str,
        summaries: &[PageSummary],
    ) -> Result<String> {
        if summaries.is_empty() {
            warn!(category, "No summaries for topic, skipping section");
            return Ok(String::new());
        }

        info!(category, "Generating topic section");

        let system = TOPIC_SECTION_PROMPT.replace("{topic_name}", category);
        let input = serde_json::to_string_pretty(summaries)?;

        let output: TopicSectionOutput = self.model.extract(&system, &input).await?;
        info!(category, "Topic section done");
        Ok(output.html_section)
    }

    /// Render one Reddit keyword's digest fragment.
    pub async fn reddit_section(&self, item: &RedditResult) -> Result<String> {
        info!(keyword = item.keyword.as_str(), "Generating Reddit section");

        let system = REDDIT_SECTION_PROMPT.replace("{keyword}", &item.keyword);
        let input = serde_json::to_string_pretty(item)?;

        let output: RedditSectionOutput = self.model.extract(&system, &input).await?;
        info!(keyword = item.keyword.as_str(), "Reddit section done");
        Ok(output.html_section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_summaries_short_circuit_without_a_model_call() {
        // The model points at an unroutable address; a call would error.
        let model = OpenAi::new("sk-test", "gpt-4o-mini").with_base_url("http://127.0.0.1:1");
        let composer = SectionComposer::new(model);

        let fragment = composer.topic_section("AI Agents", &[]).await.unwrap();
        assert_eq!(fragment, "");
    }

    #[test]
    fn prompts_interpolate_their_subject() {
        let topic = TOPIC_SECTION_PROMPT.replace("{topic_name}", "Infrastructure");
        assert!(topic.contains("the topic: Infrastructure"));
        assert!(!topic.contains("{topic_name}"));

        let reddit = REDDIT_SECTION_PROMPT.replace("{keyword}", "AI agents");
        assert!(reddit.contains("Reddit keyword: \"AI agents\""));
        assert!(!reddit.contains("{keyword}"));
    }
}
