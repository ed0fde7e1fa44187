use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use ai_client::OpenAi;
use daybrief_common::SearchResult;

use crate::prompts;

/// One relevance judgement from the filter model. The id echoes a
/// `SearchResult.id`, always as a string.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelevanceVerdict {
    pub explanation: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelevanceCheckOutput {
    #[serde(default)]
    pub relevant_results: Vec<RelevanceVerdict>,
}

pub struct RelevanceFilter {
    model: OpenAi,
}

impl RelevanceFilter {
    pub fn new(model: OpenAi) -> Self {
        Self { model }
    }

    /// Keep only the results the model judges relevant, capped at
    /// `max_results`. The cap is applied after the call; the model is not
    /// trusted to respect it.
    pub async fn filter(
        &self,
        results: &[SearchResult],
        max_results: usize,
    ) -> Result<Vec<SearchResult>> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = results.len(), "Checking search result relevance");

        let system = prompts::load("relevance_check")?;
        let input = serde_json::to_string_pretty(results)?;

        let mut output: RelevanceCheckOutput = self.model.extract(&system, &input).await?;
        output.relevant_results.truncate(max_results);

        let selected = select_relevant(results, &output.relevant_results);
        info!(selected = selected.len(), "Relevance filter complete");
        Ok(selected)
    }
}

/// Re-resolve verdict ids to full records, preserving the input order.
///
/// Equality contract: ids are compared as strings. A result with numeric id 3
/// matches a verdict id "3" and nothing else.
pub fn select_relevant(
    results: &[SearchResult],
    verdicts: &[RelevanceVerdict],
) -> Vec<SearchResult> {
    results
        .iter()
        .filter(|r| verdicts.iter().any(|v| v.id == r.id.to_string()))
        .cloned()
        .collect()
}
