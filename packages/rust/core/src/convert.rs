//! Office document → markdown conversion.
//!
//! The `.docx` reader itself is an external program that prints the
//! document's HTML on stdout (by default `mammoth`). The HTML is then turned
//! into markdown by `patentdraft-markdown`.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument};

use patentdraft_shared::{ConvertConfig, PatentDraftError, Result};

use crate::loader::decode_text;

/// Extension accepted by [`validate_document_path`].
const DOCUMENT_EXTENSION: &str = "docx";

/// Anything that can render a document as HTML.
pub trait HtmlSource {
    fn to_html(&self, path: &Path) -> Result<String>;
}

/// Converter backed by a subprocess printing HTML on stdout.
#[derive(Debug, Clone)]
pub struct CommandHtmlSource {
    program: String,
    args: Vec<String>,
}

impl CommandHtmlSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ConvertConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl HtmlSource for CommandHtmlSource {
    fn to_html(&self, path: &Path) -> Result<String> {
        debug!(cmd = %self.program, path = %path.display(), "running converter");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                PatentDraftError::Conversion(format!(
                    "failed to run `{}`: {e}. Is it installed?",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PatentDraftError::Conversion(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        decode_text(&output.stdout).ok_or_else(|| {
            PatentDraftError::Conversion(format!("`{}` produced undecodable output", self.program))
        })
    }
}

/// Check that `path` exists and is a `.docx` file (extension case-insensitive).
pub fn validate_document_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PatentDraftError::missing_input(path));
    }

    let is_docx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
    if !is_docx {
        return Err(PatentDraftError::validation(format!(
            "only .{DOCUMENT_EXTENSION} files are supported: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Convert the document at `path` to cleaned markdown.
#[instrument(skip(source), fields(path = %path.display()))]
pub fn convert_document(source: &impl HtmlSource, path: &Path) -> Result<String> {
    validate_document_path(path)?;

    let html = source.to_html(path)?;
    let markdown = patentdraft_markdown::html_to_markdown(&html)?;

    info!(html_len = html.len(), markdown_len = markdown.len(), "document converted");
    Ok(markdown)
}
