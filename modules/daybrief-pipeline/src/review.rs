//! Draft/review revision loop for the full-digest composition variant.
//!
//! Two conversational roles share one underlying chat model: a drafting role
//! that renders the digest and a reviewing role that judges it. Each role
//! keeps its own view of the transcript; the reviewer's view is the drafter's
//! transcript with user and assistant roles swapped, so the latest draft
//! always reads as an incoming proposal. The inversion is what keeps a
//! two-role chat API coherent across alternating turns.

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use ai_client::{Message, MessageRole, OpenAi};
use daybrief_common::{PageSummary, RedditResult};

use crate::prompts;

/// Outcome from the reviewing role.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReviewVerdict {
    pub approved: bool,
    pub feedback: String,
}

const REVIEW_SYSTEM_PROMPT: &str = r#"You are reviewing a draft of a daily HTML email digest proposed in the conversation.

Judge the latest draft:
- Every article and Reddit item from the source material must appear, each with its link intact.
- Sections must follow the structure the drafter was asked for (heading, linked bullets, takeaway).
- The writing must be concise and free of filler.

If the draft meets the bar, approve it. Otherwise reject it and give specific,
actionable feedback on what to change."#;

// --- Model seam ---

/// The two operations the loop needs from a model. Split out so the state
/// machine is testable with a scripted implementation.
#[async_trait]
pub trait DraftModel: Send + Sync {
    /// Produce or revise the full digest draft given the conversation so far.
    async fn draft(&self, system: &str, transcript: &[Message]) -> Result<String>;

    /// Judge the latest draft.
    async fn review(&self, system: &str, transcript: &[Message]) -> Result<ReviewVerdict>;
}

pub struct OpenAiDraftModel {
    model: OpenAi,
}

impl OpenAiDraftModel {
    pub fn new(model: OpenAi) -> Self {
        Self { model }
    }
}

#[async_trait]
impl DraftModel for OpenAiDraftModel {
    async fn draft(&self, system: &str, transcript: &[Message]) -> Result<String> {
        self.model.chat_messages(system, transcript).await
    }

    async fn review(&self, system: &str, transcript: &[Message]) -> Result<ReviewVerdict> {
        self.model.extract_messages(system, transcript).await
    }
}

// --- Review loop ---

pub struct ReviewLoop {
    model: Box<dyn DraftModel>,
    max_rounds: usize,
}

impl ReviewLoop {
    pub fn new(model: Box<dyn DraftModel>, max_rounds: usize) -> Self {
        Self { model, max_rounds }
    }

    /// Run draft and review rounds until the reviewer approves or the round
    /// cap is reached, in which case the last draft is accepted as-is.
    pub async fn run(
        &self,
        summaries: &[PageSummary],
        reddit_data: &[RedditResult],
        date: &str,
    ) -> Result<String> {
        let template = prompts::load("daily_digest_template")?;

        let material = format!(
            "Date: {date}\n\nArticle summaries:\n{}\n\nReddit data:\n{}",
            serde_json::to_string_pretty(summaries)?,
            serde_json::to_string_pretty(reddit_data)?,
        );

        let mut transcript = vec![Message::user(material)];
        let mut latest_draft = String::new();

        for round in 1..=self.max_rounds {
            info!(round, "Drafting digest");
            let draft = self.model.draft(&template, &transcript).await?;
            transcript.push(Message::assistant(draft.clone()));
            latest_draft = draft;

            let reviewer_view = invert_roles(&transcript);
            let verdict = self
                .model
                .review(REVIEW_SYSTEM_PROMPT, &reviewer_view)
                .await?;

            if verdict.approved {
                info!(round, "Draft approved");
                return Ok(latest_draft);
            }

            info!(round, feedback = verdict.feedback.as_str(), "Draft rejected, revising");
            transcript.push(Message::user(format!(
                "Reviewer feedback:\n{}",
                verdict.feedback
            )));
        }

        warn!(rounds = self.max_rounds, "Review round cap reached, accepting last draft");
        Ok(latest_draft)
    }
}

/// Swap user and assistant turns so the reviewing role sees the drafting
/// role's output as incoming messages. System turns are untouched.
fn invert_roles(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .map(|m| match m.role {
            MessageRole::User => Message::assistant(m.content.clone()),
            MessageRole::Assistant => Message::user(m.content.clone()),
            MessageRole::System => m.clone(),
        })
        .collect()
}
