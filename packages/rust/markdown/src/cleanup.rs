//! Post-conversion cleanup pipeline for Markdown output.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on freshly converted Markdown.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = strip_links(&result);
    result = normalize_whitespace(&result);
    result = collapse_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Strip links
// ---------------------------------------------------------------------------

/// Replace `[text](href)` with `text`. Images (`![alt](src)`) are kept.
fn strip_links(md: &str) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid regex"));

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if start > 0 && md.as_bytes()[start - 1] == b'!' {
                return caps[0].to_string();
            }
            caps[1].to_string()
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse every run of blank lines into a single empty line.
///
/// Whitespace-only lines count as blank. Shared with fragment normalization,
/// so converted documents and assembled sections follow one rule.
pub fn collapse_blank_lines(md: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_blank = false;

    for line in md.lines() {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        prev_blank = blank;
    }

    lines.join("\n")
}
