/// Assemble the final HTML document from per-topic and per-keyword fragments.
///
/// Pure concatenation: a date-stamped title, the non-empty topic fragments,
/// the Reddit fragments under their own heading only when any exist, and a
/// fixed footer.
pub fn assemble_email(
    topic_sections: &[String],
    reddit_sections: &[String],
    date: &str,
) -> String {
    let mut parts = vec![format!("<h1>Daybrief Daily Digest - {date}</h1>"), "<hr>".to_string()];

    parts.extend(topic_sections.iter().filter(|s| !s.is_empty()).cloned());

    if reddit_sections.iter().any(|s| !s.is_empty()) {
        parts.push("<h1>Reddit Digest</h1>".to_string());
        parts.push("<hr>".to_string());
        parts.extend(reddit_sections.iter().filter(|s| !s.is_empty()).cloned());
    }

    parts.push("<p><i>Generated automatically by daybrief</i></p>".to_string());

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_fragments_with_title_and_footer() {
        let html = assemble_email(
            &["<h2>Topic A</h2>".to_string()],
            &["<h2>Keyword</h2>".to_string()],
            "2026-08-07",
        );

        assert!(html.starts_with("<h1>Daybrief Daily Digest - 2026-08-07</h1>"));
        assert!(html.contains("<h2>Topic A</h2>"));
        assert!(html.contains("<h1>Reddit Digest</h1>"));
        assert!(html.contains("<h2>Keyword</h2>"));
        assert!(html.ends_with("<p><i>Generated automatically by daybrief</i></p>"));
    }

    #[test]
    fn empty_fragments_are_skipped() {
        let html = assemble_email(
            &["".to_string(), "<h2>Kept</h2>".to_string()],
            &[],
            "2026-08-07",
        );

        assert!(html.contains("<h2>Kept</h2>"));
        assert!(!html.contains("\n\n\n"));
    }

    #[test]
    fn reddit_heading_appears_only_when_a_fragment_exists() {
        let without = assemble_email(&["<h2>T</h2>".to_string()], &[], "2026-08-07");
        assert!(!without.contains("Reddit Digest"));

        let all_empty = assemble_email(
            &["<h2>T</h2>".to_string()],
            &["".to_string(), "".to_string()],
            "2026-08-07",
        );
        assert!(!all_empty.contains("Reddit Digest"));
    }

    #[test]
    fn zero_content_still_produces_a_framed_document() {
        let html = assemble_email(&[], &[], "2026-08-07");
        assert!(html.starts_with("<h1>Daybrief Daily Digest - 2026-08-07</h1>"));
        assert!(html.ends_with("</p>"));
    }
}
