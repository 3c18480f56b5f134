//! Draft assembler.
//!
//! Walks a section catalog in order, loads each fragment from a case
//! directory and renders it through a [`RenderPolicy`], producing one
//! document whose section order never depends on what exists on disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, instrument, warn};

use patentdraft_shared::{Fragment, Result};

use crate::catalog::SectionCatalog;
use crate::loader::{DirStore, FragmentStore, load_fragment};
use crate::render::{DocumentContext, PlaceholderPolicy, PlainPolicy, RenderPolicy};

/// What happened to one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// Fragment present and rendered.
    Rendered,
    /// Required fragment missing; an error marker stands in its place.
    Missing,
}

/// One rendered section, in catalog order.
#[derive(Debug, Clone)]
pub struct SectionBlock {
    pub filename: &'static str,
    pub status: BlockStatus,
    pub text: String,
}

/// Output of a single assembly run.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub header: String,
    pub blocks: Vec<SectionBlock>,
    /// Required files that were not found, in catalog order.
    pub missing: Vec<&'static str>,
}

impl AssembledDocument {
    /// Concatenate header and blocks into the final document text.
    pub fn render(&self) -> String {
        std::iter::once(self.header.as_str())
            .chain(self.blocks.iter().map(|b| b.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Catalog walker parameterized by a render policy.
#[derive(Debug, Clone)]
pub struct DocumentAssembler<P> {
    catalog: SectionCatalog,
    policy: P,
}

impl<P: RenderPolicy> DocumentAssembler<P> {
    pub fn new(catalog: SectionCatalog, policy: P) -> Self {
        Self { catalog, policy }
    }

    /// Assemble every catalog section from `store`.
    ///
    /// A section that fails to load is logged and treated as absent; it
    /// never aborts the run.
    #[instrument(skip_all, fields(case = %context.case_id, sections = self.catalog.len()))]
    pub fn assemble(
        &self,
        store: &impl FragmentStore,
        context: &DocumentContext,
    ) -> AssembledDocument {
        let header = self.policy.document_header(context);
        let mut blocks = Vec::with_capacity(self.catalog.len());
        let mut missing = Vec::new();

        for section in self.catalog.sections() {
            let fragment = load_fragment(store, section).unwrap_or_else(|e| {
                warn!(file = section.filename, error = %e, "failed to load section, treating as absent");
                Fragment::absent(store.locate(section.filename))
            });

            match fragment.text {
                Some(text) => {
                    debug!(file = section.filename, "rendering section");
                    blocks.push(SectionBlock {
                        filename: section.filename,
                        status: BlockStatus::Rendered,
                        text: self.policy.render_present(section, &text),
                    });
                }
                None if section.required => {
                    warn!(file = section.filename, "required section missing");
                    missing.push(section.filename);
                    if let Some(text) = self.policy.render_missing(section) {
                        blocks.push(SectionBlock {
                            filename: section.filename,
                            status: BlockStatus::Missing,
                            text,
                        });
                    }
                }
                None => debug!(file = section.filename, "optional section absent, skipped"),
            }
        }

        info!(
            rendered = blocks.iter().filter(|b| b.status == BlockStatus::Rendered).count(),
            missing = missing.len(),
            "draft assembled"
        );

        AssembledDocument {
            header,
            blocks,
            missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Draft styles
// ---------------------------------------------------------------------------

/// The two supported draft shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStyle {
    /// Filing-order draft with placeholder titles and visible gaps.
    Placeholder,
    /// Clean concatenation in generation order.
    Plain,
}

/// Assemble the case directory `dir` in the given style, stamped with `now`.
pub fn assemble_case_at(
    dir: &Path,
    style: DraftStyle,
    now: DateTime<Local>,
) -> Result<AssembledDocument> {
    let store = DirStore::open(dir)?;
    let context = DocumentContext {
        case_id: case_identifier(&case_dir_name(dir)),
        generated_at: now,
    };

    let document = match style {
        DraftStyle::Placeholder => {
            DocumentAssembler::new(SectionCatalog::placeholder(), PlaceholderPolicy)
                .assemble(&store, &context)
        }
        DraftStyle::Plain => {
            DocumentAssembler::new(SectionCatalog::plain(), PlainPolicy).assemble(&store, &context)
        }
    };

    Ok(document)
}

/// Assemble the case directory `dir`, stamped with the current time.
pub fn assemble_case(dir: &Path, style: DraftStyle) -> Result<AssembledDocument> {
    assemble_case_at(dir, style, Local::now())
}

/// Derive the case identifier from a case directory name.
///
/// `case-001_20250123_1430` → `case-001`: the last two `_`-separated
/// segments (date and time) are dropped. Names without `_` are kept as-is.
pub fn case_identifier(dir_name: &str) -> String {
    if !dir_name.contains('_') {
        return dir_name.to_string();
    }
    match dir_name.rsplitn(3, '_').last() {
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => dir_name.to_string(),
    }
}

/// Final path component of `dir`, resolving `.`-style paths first.
fn case_dir_name(dir: &Path) -> String {
    let resolved: PathBuf = match dir.file_name() {
        Some(_) => dir.to_path_buf(),
        None => std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()),
    };
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
