//! Error types for patentdraft.
//!
//! Library crates use [`PatentDraftError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all patentdraft operations.
#[derive(Debug, thiserror::Error)]
pub enum PatentDraftError {
    /// Configuration loading or validation error (includes a missing API key).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the generation endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The generation endpoint answered, but not with usable text.
    #[error("generation error: {0}")]
    Generation(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file could not be decoded with any of the supported encodings.
    #[error("cannot decode {path:?}: not valid UTF-8, GBK or GB18030")]
    Encoding { path: PathBuf },

    /// An input the caller named (case directory, prompt, context file) is missing.
    #[error("input not found: {path:?}")]
    MissingInput { path: PathBuf },

    /// Data validation error (bad extension, out-of-range parameter, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Document-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PatentDraftError>;

impl PatentDraftError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PatentDraftError::config("GLM_API_KEY not set");
        assert_eq!(err.to_string(), "config error: GLM_API_KEY not set");

        let err = PatentDraftError::validation("temperature 1.5 out of range");
        assert!(err.to_string().contains("temperature 1.5"));
    }

    #[test]
    fn missing_input_names_the_path() {
        let err = PatentDraftError::missing_input("output/case-001");
        assert!(err.to_string().contains("output/case-001"));
    }
}
