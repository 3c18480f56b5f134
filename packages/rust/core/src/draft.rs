//! Section generation: prompt + context → one generated fragment on disk.
//!
//! The user message is the prompt template followed by every context file
//! under a `## <file name>` heading. The generated text is written to the
//! requested output; when that output is the claims file, the explanation
//! addendum is split off (see [`crate::claims`]).

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use patentdraft_generation::{GenerationRequest, TextGenerator};
use patentdraft_shared::{PatentDraftError, Result, validate_temperature};

use crate::claims::{DelimiterRule, is_claims_output, persist_split, split_claims};
use crate::loader::read_text_file;

/// Characters of the user message shown by a dry run.
pub const PREVIEW_CHARS: usize = 1000;

/// Rough characters-per-token ratio for the input size estimate.
const CHARS_PER_TOKEN: usize = 3;

/// Everything one generation run needs.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub prompt: PathBuf,
    pub contexts: Vec<PathBuf>,
    pub output: PathBuf,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub delimiter: DelimiterRule,
}

impl DraftRequest {
    /// Input files exist and the temperature is in range.
    pub fn validate(&self) -> Result<()> {
        check_inputs(&self.prompt, &self.contexts)?;
        validate_temperature(self.temperature)
    }
}

/// What a dry run would send.
#[derive(Debug, Clone)]
pub struct DraftPreview {
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub prompt: PathBuf,
    pub contexts: Vec<PathBuf>,
    pub output: PathBuf,
    pub estimated_tokens: usize,
    /// First [`PREVIEW_CHARS`] characters of the user message.
    pub excerpt: String,
}

/// Result of a completed generation run.
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub output: PathBuf,
    pub explanation: Option<PathBuf>,
    pub model: String,
    pub output_tokens: Option<u64>,
}

/// Fail on the first prompt or context path that does not exist.
pub fn check_inputs(prompt: &Path, contexts: &[PathBuf]) -> Result<()> {
    std::iter::once(prompt)
        .chain(contexts.iter().map(PathBuf::as_path))
        .find(|p| !p.is_file())
        .map_or(Ok(()), |p| Err(PatentDraftError::missing_input(p)))
}

/// Prompt text, then `\n\n## <file name>\n\n<text>` per context file in order.
pub fn build_user_message(prompt: &Path, contexts: &[PathBuf]) -> Result<String> {
    let mut message = read_text_file(prompt)?;

    for context in contexts {
        let text = read_text_file(context)?;
        let name = context
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| context.display().to_string());
        message.push_str(&format!("\n\n## {name}\n\n{text}"));
    }

    Ok(message)
}

pub fn estimate_tokens(message: &str) -> usize {
    message.chars().count() / CHARS_PER_TOKEN
}

/// Build the preview shown by `--dry-run`. Nothing is sent.
pub fn dry_run_preview(request: &DraftRequest, endpoint: &str) -> Result<DraftPreview> {
    request.validate()?;
    let message = build_user_message(&request.prompt, &request.contexts)?;

    Ok(DraftPreview {
        model: request.model.clone(),
        endpoint: endpoint.to_string(),
        temperature: request.temperature,
        prompt: request.prompt.clone(),
        contexts: request.contexts.clone(),
        output: request.output.clone(),
        estimated_tokens: estimate_tokens(&message),
        excerpt: message.chars().take(PREVIEW_CHARS).collect(),
    })
}

/// Generate one section and write it to `request.output`.
#[instrument(skip_all, fields(output = %request.output.display(), model = %request.model))]
pub async fn generate_section<G: TextGenerator>(
    generator: &G,
    request: &DraftRequest,
) -> Result<DraftOutcome> {
    request.validate()?;
    let user_message = build_user_message(&request.prompt, &request.contexts)?;

    info!(
        endpoint = %generator.endpoint(),
        contexts = request.contexts.len(),
        estimated_tokens = estimate_tokens(&user_message),
        "requesting section draft"
    );

    let generated = generator
        .generate(&GenerationRequest {
            model: request.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            user_message,
        })
        .await?;

    let explanation = write_output(&request.output, &generated.text, request.delimiter)?;

    Ok(DraftOutcome {
        output: request.output.clone(),
        explanation,
        model: generated.model,
        output_tokens: generated.output_tokens,
    })
}

/// Write generated text, creating parent directories.
///
/// The claims output is split; its explanation path is returned when one
/// was written. Any other output is written verbatim.
pub fn write_output(path: &Path, text: &str, rule: DelimiterRule) -> Result<Option<PathBuf>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PatentDraftError::io(parent, e))?;
    }

    let explanation = if is_claims_output(path) {
        persist_split(path, &split_claims(text, rule))?
    } else {
        std::fs::write(path, text).map_err(|e| PatentDraftError::io(path, e))?;
        None
    };

    info!(path = %path.display(), "section written");
    Ok(explanation)
}
