//! HTML-to-Markdown conversion and fragment normalization.
//!
//! Converts the HTML produced by an office-document converter to clean
//! Markdown using the `htmd` crate, then applies cleanup passes (link
//! stripping, whitespace, blank-line collapsing). The [`normalize`] module
//! holds the passes every assembler applies to a section fragment.

mod cleanup;
pub mod normalize;

use scraper::Html;
use tracing::{debug, instrument};

use patentdraft_shared::{PatentDraftError, Result};

pub use cleanup::collapse_blank_lines;
pub use normalize::{normalize_fragment, starts_with_heading, strip_leading_title};

/// Tags dropped together with their content during conversion.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "head"];

/// Convert converter-produced HTML to clean Markdown.
///
/// 1. Extracts `<body>` content when given a full document
/// 2. Converts HTML → Markdown via `htmd` (ATX headings)
/// 3. Strips links down to their text
/// 4. Collapses blank-line runs and trims
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn html_to_markdown(html: &str) -> Result<String> {
    let content_html = extract_body_html(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| PatentDraftError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

    let cleaned = cleanup::run_pipeline(&raw_markdown);

    debug!(final_len = cleaned.len(), "cleanup complete");
    Ok(cleaned)
}

/// Return the `<body>` inner HTML of a full document, or the input unchanged
/// when it is already a fragment.
fn extract_body_html(html: &str) -> String {
    if !html.contains("<body") {
        return html.to_string();
    }

    let doc = Html::parse_document(html);
    if let Ok(body_sel) = scraper::Selector::parse("body") {
        if let Some(body) = doc.select(&body_sel).next() {
            return body.inner_html();
        }
    }

    html.to_string()
}
