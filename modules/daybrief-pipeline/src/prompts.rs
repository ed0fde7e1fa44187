use std::path::Path;

use anyhow::{anyhow, Result};

/// Load a prompt template by name. Templates ship embedded in the binary; a
/// `prompts/` directory in the working directory overrides them, so prompt
/// edits do not need a rebuild.
pub fn load(name: &str) -> Result<String> {
    let path = Path::new("prompts").join(format!("{name}.md"));
    if let Ok(text) = std::fs::read_to_string(&path) {
        return Ok(text);
    }

    builtin(name)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Unknown prompt template: {name}"))
}

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "relevance_check" => Some(include_str!("../../../prompts/relevance_check.md")),
        "summarise_markdown_page" => {
            Some(include_str!("../../../prompts/summarise_markdown_page.md"))
        }
        "daily_digest_template" => Some(include_str!("../../../prompts/daily_digest_template.md")),
        _ => None,
    }
}
