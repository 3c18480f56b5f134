//! Shared types, error model, and configuration for patentdraft.
//!
//! This crate is the foundation depended on by all other patentdraft crates.
//! It provides:
//! - [`PatentDraftError`], the unified error type
//! - Domain types ([`SectionDescriptor`], [`Fragment`], [`ClaimsSplit`])
//! - Configuration ([`AppConfig`], config loading, API key discovery)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClaimsConfig, ConvertConfig, GenerationConfig, config_dir, config_file_path,
    discover_api_key, init_config, load_config, load_config_from, validate_temperature,
};
pub use error::{PatentDraftError, Result};
pub use types::{ClaimsSplit, Fragment, Presence, SectionDescriptor};
