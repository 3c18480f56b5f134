//! Core domain types for patent draft assembly.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// SectionDescriptor
// ---------------------------------------------------------------------------

/// One entry of a section catalog.
///
/// `title` may span several lines and carry its own nested heading markers
/// and bracketed placeholders (e.g. `技术领域\n\n[待补充]\n\n## 背景技术`);
/// renderers prefix only its first line with a heading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Canonical file name inside a case directory, unique within a catalog.
    pub filename: &'static str,
    /// Display title or multi-line placeholder block.
    pub title: &'static str,
    /// Whether absence must be flagged rather than silently skipped.
    pub required: bool,
}

impl SectionDescriptor {
    pub const fn required(filename: &'static str, title: &'static str) -> Self {
        Self {
            filename,
            title,
            required: true,
        }
    }

    pub const fn optional(filename: &'static str, title: &'static str) -> Self {
        Self {
            filename,
            title,
            required: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// Whether a section's file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// A section's content as loaded for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Where the content came from (or would have come from).
    pub source_path: PathBuf,
    /// Trimmed text; `None` when the file does not exist.
    pub text: Option<String>,
}

impl Fragment {
    pub fn present(source_path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            text: Some(text.into()),
        }
    }

    pub fn absent(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            text: None,
        }
    }

    pub fn presence(&self) -> Presence {
        match self.text {
            Some(_) => Presence::Present,
            None => Presence::Absent,
        }
    }
}

// ---------------------------------------------------------------------------
// ClaimsSplit
// ---------------------------------------------------------------------------

/// Claims output partitioned at its first structural delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsSplit {
    /// The legal claims body. Never empty when `explanation` is `Some`.
    pub primary: String,
    /// Explanatory addendum that followed the delimiter.
    pub explanation: Option<String>,
}

impl ClaimsSplit {
    pub fn is_split(&self) -> bool {
        self.explanation.is_some()
    }
}
