//! Fragment normalization applied before a section is assembled.
//!
//! Generated fragments often open with their own `# Title`, which would
//! clash with the heading the assembler emits, and tend to carry runs of
//! blank lines. These passes make fragments compose cleanly.

use std::sync::LazyLock;

use regex::Regex;

use crate::cleanup::collapse_blank_lines;

/// Normalize a fragment: drop stray leading top-level headers, collapse
/// blank-line runs, trim.
///
/// Every top-level header in the leading run is removed (blank lines between
/// them are allowed), which keeps the function idempotent.
pub fn normalize_fragment(text: &str) -> String {
    let body = strip_leading_top_level_headers(text);
    collapse_blank_lines(body).trim().to_string()
}

/// Remove one leading level-1 heading, ATX (`# x`) or Setext (`x` over `===`).
///
/// Used by the plain concatenation renderer, which wraps every fragment under
/// its own `##` heading.
pub fn strip_leading_title(text: &str) -> String {
    static SETEXT_H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^=+\s*$").expect("valid regex"));

    let text = text.trim();
    let mut lines = text.lines();

    let Some(first) = lines.next() else {
        return String::new();
    };

    if is_top_level_heading(first) {
        return lines.collect::<Vec<_>>().join("\n").trim().to_string();
    }

    let mut rest = lines.clone();
    if rest.next().is_some_and(|second| SETEXT_H1_RE.is_match(second)) {
        return rest.collect::<Vec<_>>().join("\n").trim().to_string();
    }

    text.to_string()
}

/// Whether the (trimmed) text opens with an ATX heading of any level.
pub fn starts_with_heading(text: &str) -> bool {
    text.trim_start().starts_with('#')
}

/// Skip leading blank lines and top-level header lines.
fn strip_leading_top_level_headers(text: &str) -> &str {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_top_level_heading(trimmed) {
            offset += line.len();
        } else {
            break;
        }
    }
    &text[offset..]
}

fn is_top_level_heading(line: &str) -> bool {
    let line = line.trim_start();
    line == "#" || line.starts_with("# ") || line.starts_with("#\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_leading_h1() {
        let input = "# 背景技术\n\n现有技术中存在以下问题。";
        assert_eq!(normalize_fragment(input), "现有技术中存在以下问题。");
    }

    #[test]
    fn keeps_leading_h2() {
        let input = "## 背景技术\n\n现有技术。";
        assert_eq!(normalize_fragment(input), input);
    }

    #[test]
    fn h1_after_blank_lines_is_removed() {
        let input = "\n\n  # 摘要\n正文";
        assert_eq!(normalize_fragment(input), "正文");
    }

    #[test]
    fn h1_later_in_text_is_kept() {
        let input = "正文\n\n# 附录";
        assert_eq!(normalize_fragment(input), input);
    }

    #[test]
    fn collapses_blank_runs() {
        let input = "第一段\n\n\n\n第二段\n   \n\n第三段";
        assert_eq!(normalize_fragment(input), "第一段\n\n第二段\n\n第三段");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "# 标题\n\n\n正文\n\n\n\n结尾\n",
            "# A\n\n# B\n\ntext",
            "## 保留\n\n\ntext   \n\n",
            "   \n\n",
            "",
            "plain",
            "#\n# \n\n内容",
        ];
        for sample in samples {
            let once = normalize_fragment(sample);
            assert_eq!(normalize_fragment(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn strip_leading_title_atx() {
        assert_eq!(strip_leading_title("# 摘要\n\n本发明公开了..."), "本发明公开了...");
    }

    #[test]
    fn strip_leading_title_setext() {
        assert_eq!(strip_leading_title("摘要\n====\n\n本发明公开了..."), "本发明公开了...");
    }

    #[test]
    fn strip_leading_title_only_one() {
        assert_eq!(strip_leading_title("# A\n# B\nbody"), "# B\nbody");
    }

    #[test]
    fn strip_leading_title_leaves_h2() {
        assert_eq!(strip_leading_title("## 子标题\nbody"), "## 子标题\nbody");
    }

    #[test]
    fn heading_detection() {
        assert!(starts_with_heading("### 有益效果"));
        assert!(!starts_with_heading("有益效果"));
    }
}
