//! Claims post-processing: splitting the claims output from its explanation.
//!
//! Generated claims often end with an explanatory addendum separated by a
//! horizontal rule. The claims file must hold only the claims, so the text is
//! partitioned at the first delimiter and the addendum is written to a
//! sibling `<stem>_解释.md` file.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use patentdraft_shared::{ClaimsSplit, PatentDraftError, Result};

use crate::catalog::{CLAIMS_FILE, EXPLANATION_SUFFIX};
use crate::loader::read_text_file;

/// Which `---` lines count as the claims/explanation boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelimiterRule {
    /// Any line made only of three or more hyphens.
    #[default]
    AnyLine,
    /// Such a line standing alone as its own paragraph.
    Paragraph,
}

impl DelimiterRule {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Paragraph } else { Self::AnyLine }
    }
}

/// Files written by [`persist_split`].
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub claims_path: PathBuf,
    pub explanation_path: Option<PathBuf>,
    pub split: ClaimsSplit,
}

/// Partition claims text at its first delimiter.
///
/// Without a delimiter the whole trimmed text is the primary body. A
/// delimiter with nothing but whitespace before it does not split.
pub fn split_claims(text: &str, rule: DelimiterRule) -> ClaimsSplit {
    let lines: Vec<&str> = text.lines().collect();

    let delimiter = lines.iter().enumerate().find_map(|(i, line)| {
        let structural = is_rule_line(line)
            && match rule {
                DelimiterRule::AnyLine => true,
                DelimiterRule::Paragraph => stands_alone(&lines, i),
            };
        structural.then_some(i)
    });

    let whole = || ClaimsSplit {
        primary: text.trim().to_string(),
        explanation: None,
    };

    let Some(at) = delimiter else {
        return whole();
    };

    let primary = lines[..at].join("\n").trim().to_string();
    if primary.is_empty() {
        debug!(line = at, "delimiter has no claims before it, not splitting");
        return whole();
    }

    let explanation = lines[at + 1..].join("\n").trim().to_string();
    debug!(line = at, explanation_len = explanation.len(), "claims delimiter found");

    ClaimsSplit {
        primary,
        explanation: (!explanation.is_empty()).then_some(explanation),
    }
}

/// Whether `path` is the canonical claims output.
pub fn is_claims_output(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == CLAIMS_FILE)
}

/// Sibling path for the explanation of `claims_path`
/// (`02_权利要求书.md` → `02_权利要求书_解释.md`).
pub fn explanation_path(claims_path: &Path) -> PathBuf {
    let stem = claims_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match claims_path.extension() {
        Some(ext) => format!("{stem}{EXPLANATION_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{EXPLANATION_SUFFIX}"),
    };
    claims_path.with_file_name(file_name)
}

/// Write the primary body over `claims_path` and the explanation, if any,
/// next to it. The two writes are independent, not one atomic step.
#[instrument(skip(split), fields(path = %claims_path.display()))]
pub fn persist_split(claims_path: &Path, split: &ClaimsSplit) -> Result<Option<PathBuf>> {
    std::fs::write(claims_path, &split.primary)
        .map_err(|e| PatentDraftError::io(claims_path, e))?;

    let Some(explanation) = &split.explanation else {
        return Ok(None);
    };

    let path = explanation_path(claims_path);
    std::fs::write(&path, explanation).map_err(|e| PatentDraftError::io(&path, e))?;
    info!(path = %path.display(), "explanation separated from claims");

    Ok(Some(path))
}

/// Re-run the split on an existing claims file.
pub fn split_file(claims_path: &Path, rule: DelimiterRule) -> Result<SplitOutcome> {
    let text = read_text_file(claims_path)?;
    let split = split_claims(&text, rule);
    let explanation_path = persist_split(claims_path, &split)?;

    Ok(SplitOutcome {
        claims_path: claims_path.to_path_buf(),
        explanation_path,
        split,
    })
}

fn is_rule_line(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

fn stands_alone(lines: &[&str], i: usize) -> bool {
    let blank = |j: usize| lines[j].trim().is_empty();
    (i == 0 || blank(i - 1)) && (i + 1 == lines.len() || blank(i + 1))
}
