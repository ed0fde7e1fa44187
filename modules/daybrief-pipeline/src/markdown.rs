//! HTML to simplified-markdown conversion for scraped pages.
//!
//! The rewrite passes run in a fixed order, each over the output of the
//! previous one: headings, anchors, emphasis, lists, then a final pass that
//! strips whatever tags remain and collapses blank lines. The order is
//! observable in the output (list items keep markers that the strip pass
//! would otherwise have discarded), so it must not be rearranged.

use regex::{Captures, Regex};

/// Convert an HTML document to simplified markdown. Idempotent on text that
/// contains no tags.
pub fn html_to_markdown(html: &str) -> String {
    let mut text = html.to_string();

    // 1. Headings h1-h6
    let heading_re = Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>").expect("valid regex");
    text = heading_re
        .replace_all(&text, |caps: &Captures| {
            let level: usize = caps[1].parse().unwrap_or(1);
            format!("{} {}\n\n", "#".repeat(level), strip_tags(&caps[2]))
        })
        .into_owned();

    // 2. Anchors: only those with both an href and visible text become links;
    //    the rest fall through to the strip pass as plain text.
    let anchor_re =
        Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
            .expect("valid regex");
    text = anchor_re
        .replace_all(&text, |caps: &Captures| {
            let href = caps[1].trim();
            let label = strip_tags(&caps[2]);
            if href.is_empty() || label.trim().is_empty() {
                caps[0].to_string()
            } else {
                format!("[{label}]({href})")
            }
        })
        .into_owned();

    // 3. Bold and italic
    for (pattern, marker) in [
        (r"(?is)<(?:b|strong)\b[^>]*>(.*?)</(?:b|strong)\s*>", "**"),
        (r"(?is)<(?:i|em)\b[^>]*>(.*?)</(?:i|em)\s*>", "*"),
    ] {
        let re = Regex::new(pattern).expect("valid regex");
        text = re
            .replace_all(&text, |caps: &Captures| {
                format!("{marker}{}{marker}", strip_tags(&caps[1]))
            })
            .into_owned();
    }

    // 4. Lists: unordered items become "- text", ordered items are numbered
    //    1-based per list.
    let li_re = Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").expect("valid regex");

    let ul_re = Regex::new(r"(?is)<ul\b[^>]*>(.*?)</ul\s*>").expect("valid regex");
    text = ul_re
        .replace_all(&text, |caps: &Captures| {
            li_re
                .replace_all(&caps[1], |li: &Captures| {
                    format!("- {}\n", strip_tags(&li[1]))
                })
                .into_owned()
        })
        .into_owned();

    let ol_re = Regex::new(r"(?is)<ol\b[^>]*>(.*?)</ol\s*>").expect("valid regex");
    text = ol_re
        .replace_all(&text, |caps: &Captures| {
            let mut n = 0;
            li_re
                .replace_all(&caps[1], |li: &Captures| {
                    n += 1;
                    format!("{n}. {}\n", strip_tags(&li[1]))
                })
                .into_owned()
        })
        .into_owned();

    // 5. Strip remaining tags, collapse blank-line runs, trim.
    let text = decode_entities(&strip_tags(&text));
    let collapse_re = Regex::new(r"\n\s*\n").expect("valid regex");
    collapse_re.replace_all(&text, "\n\n").trim().to_string()
}

/// Drop every tag, keeping inner text.
fn strip_tags(html: &str) -> String {
    let tag_re = Regex::new(r"(?s)<[^>]+>").expect("valid regex");
    tag_re.replace_all(html, "").into_owned()
}

/// Decode the handful of entities that show up constantly in article bodies.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
