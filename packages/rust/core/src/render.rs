//! Render policies: how each section block of a draft is written.
//!
//! The assembler walks the catalog; a [`RenderPolicy`] decides what the
//! document header looks like, how a present fragment is framed and what, if
//! anything, stands in for a missing required one.

use chrono::{DateTime, Local};

use patentdraft_markdown::{
    collapse_blank_lines, normalize_fragment, starts_with_heading, strip_leading_title,
};
use patentdraft_shared::SectionDescriptor;

/// Title line of every assembled document.
pub const DOCUMENT_TITLE: &str = "# 专利申请文件";

/// Rule placed after each section block.
pub const SEPARATOR: &str = "---";

/// Timestamp format of the header block.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Per-run values the header block may show.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub case_id: String,
    pub generated_at: DateTime<Local>,
}

/// Rendering strategy injected into the assembler.
pub trait RenderPolicy {
    /// Header block placed before all sections.
    fn document_header(&self, context: &DocumentContext) -> String;

    /// Block for a fragment that exists. `text` is already trimmed.
    fn render_present(&self, section: &SectionDescriptor, text: &str) -> String;

    /// Block for a required fragment that is missing; `None` omits it.
    fn render_missing(&self, section: &SectionDescriptor) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Placeholder policy
// ---------------------------------------------------------------------------

/// Draft with explicit gaps: titles injected where the fragment has none,
/// inline error markers for missing sections, separators after every block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderPolicy;

impl RenderPolicy for PlaceholderPolicy {
    fn document_header(&self, context: &DocumentContext) -> String {
        format!(
            "{DOCUMENT_TITLE}\n\n**案件编号：** {}\n\n**生成时间：** {}\n\n{SEPARATOR}\n",
            context.case_id,
            context.generated_at.format(TIMESTAMP_FORMAT)
        )
    }

    fn render_present(&self, section: &SectionDescriptor, text: &str) -> String {
        let content = normalize_fragment(text);

        let mut parts: Vec<String> = Vec::with_capacity(2);
        if !starts_with_heading(&content) {
            parts.push(format!("## {}", section.title));
        }
        if !content.is_empty() {
            parts.push(content);
        }

        format!("{}\n\n{SEPARATOR}\n", parts.join("\n\n"))
    }

    fn render_missing(&self, section: &SectionDescriptor) -> Option<String> {
        Some(format!(
            "## {}\n\n{}\n\n{SEPARATOR}\n",
            section.title,
            missing_marker(section.filename)
        ))
    }
}

/// Inline marker standing in for a missing required fragment.
pub fn missing_marker(filename: &str) -> String {
    format!("**[错误：缺少文件 {filename}]**")
}

// ---------------------------------------------------------------------------
// Plain policy
// ---------------------------------------------------------------------------

/// Clean concatenation: every fragment under a `##` heading of its plain
/// title, missing sections left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPolicy;

impl RenderPolicy for PlainPolicy {
    fn document_header(&self, _context: &DocumentContext) -> String {
        format!("{DOCUMENT_TITLE}\n")
    }

    fn render_present(&self, section: &SectionDescriptor, text: &str) -> String {
        let body = collapse_blank_lines(&strip_leading_title(text));
        format!("## {}\n\n{}\n", section.title, body.trim())
    }

    fn render_missing(&self, _section: &SectionDescriptor) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const ABSTRACT: SectionDescriptor = SectionDescriptor::required("05_摘要.md", "摘要");
    const BACKGROUND: SectionDescriptor =
        SectionDescriptor::required("01_背景技术.md", "技术领域\n\n[待补充]\n\n## 背景技术");

    fn context() -> DocumentContext {
        DocumentContext {
            case_id: "case-001".into(),
            generated_at: Local.with_ymd_and_hms(2025, 1, 23, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn placeholder_header_shows_case_and_time() {
        let header = PlaceholderPolicy.document_header(&context());
        assert_eq!(
            header,
            "# 专利申请文件\n\n**案件编号：** case-001\n\n**生成时间：** 2025-01-23 14:30\n\n---\n"
        );
    }

    #[test]
    fn placeholder_injects_title_when_missing_heading() {
        let block = PlaceholderPolicy.render_present(&ABSTRACT, "本发明公开了一种方法。");
        assert_eq!(block, "## 摘要\n\n本发明公开了一种方法。\n\n---\n");
    }

    #[test]
    fn placeholder_multiline_title() {
        let block = PlaceholderPolicy.render_present(&BACKGROUND, "# 背景技术\n\n现有技术……");
        assert_eq!(
            block,
            "## 技术领域\n\n[待补充]\n\n## 背景技术\n\n现有技术……\n\n---\n"
        );
    }

    #[test]
    fn placeholder_keeps_own_heading() {
        let block = PlaceholderPolicy.render_present(&ABSTRACT, "## 摘要\n\n正文");
        assert_eq!(block, "## 摘要\n\n正文\n\n---\n");
        assert_eq!(block.matches("## 摘要").count(), 1);
    }

    #[test]
    fn placeholder_header_only_fragment() {
        let block = PlaceholderPolicy.render_present(&ABSTRACT, "# 摘要");
        assert_eq!(block, "## 摘要\n\n---\n");
    }

    #[test]
    fn placeholder_missing_marker() {
        let block = PlaceholderPolicy.render_missing(&ABSTRACT).unwrap();
        assert_eq!(block, "## 摘要\n\n**[错误：缺少文件 05_摘要.md]**\n\n---\n");
    }

    #[test]
    fn plain_wraps_under_section_title() {
        let block = PlainPolicy.render_present(&ABSTRACT, "# 说明书摘要\n\n\n\n本发明……");
        assert_eq!(block, "## 摘要\n\n本发明……\n");
    }

    #[test]
    fn plain_omits_missing_and_has_bare_header() {
        assert!(PlainPolicy.render_missing(&ABSTRACT).is_none());
        assert_eq!(PlainPolicy.document_header(&context()), "# 专利申请文件\n");
    }
}
