//! Application configuration for patentdraft.
//!
//! User config lives at `~/.patentdraft/patentdraft.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PatentDraftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "patentdraft.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".patentdraft";

// ---------------------------------------------------------------------------
// Config structs (matching patentdraft.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation endpoint settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Document converter settings.
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Claims post-processing.
    #[serde(default)]
    pub claims: ClaimsConfig,
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the Anthropic-compatible Messages endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Default sampling temperature (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for one generation call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Key-value file consulted when the env var is unset, relative to the cwd.
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            env_file: default_env_file(),
        }
    }
}

fn default_base_url() -> String {
    "https://open.bigmodel.cn/api/anthropic".into()
}
fn default_model() -> String {
    "glm-4.7".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_api_key_env() -> String {
    "GLM_API_KEY".into()
}
fn default_env_file() -> String {
    ".env".into()
}

/// `[convert]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Program that prints a document's HTML on stdout.
    #[serde(default = "default_convert_command")]
    pub command: String,

    /// Extra arguments placed before the document path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            command: default_convert_command(),
            args: Vec::new(),
        }
    }
}

fn default_convert_command() -> String {
    "mammoth".into()
}

/// `[claims]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimsConfig {
    /// Only split on a `---` line that stands as its own paragraph.
    #[serde(default)]
    pub strict_delimiter: bool,
}

impl GenerationConfig {
    /// Check the values a generation call depends on.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url).map_err(|e| {
            PatentDraftError::config(format!("invalid base_url '{}': {e}", self.base_url))
        })?;
        validate_temperature(self.temperature)?;
        if self.max_tokens == 0 {
            return Err(PatentDraftError::config("max_tokens must be positive"));
        }
        Ok(())
    }
}

/// Temperatures outside `0.0..=1.0` are rejected.
pub fn validate_temperature(temperature: f32) -> Result<()> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(())
    } else {
        Err(PatentDraftError::validation(format!(
            "temperature {temperature} out of range (expected 0.0 - 1.0)"
        )))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.patentdraft/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PatentDraftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.patentdraft/patentdraft.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PatentDraftError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PatentDraftError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PatentDraftError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PatentDraftError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PatentDraftError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Credential discovery
// ---------------------------------------------------------------------------

/// Find the generation API key.
///
/// Looks up `api_key_env` through `env` first, then scans `env_file` (resolved
/// against `base_dir`) for a `NAME=value` line. Empty values count as unset.
/// `env` is injected so callers can test without touching the process env.
pub fn discover_api_key(
    config: &GenerationConfig,
    base_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    let var_name = &config.api_key_env;

    if let Some(key) = env(var_name).filter(|v| !v.trim().is_empty()) {
        tracing::debug!(var = %var_name, "API key taken from environment");
        return Ok(key.trim().to_string());
    }

    let env_file = base_dir.join(&config.env_file);
    if env_file.is_file() {
        let content =
            std::fs::read_to_string(&env_file).map_err(|e| PatentDraftError::io(&env_file, e))?;
        if let Some(key) = key_from_env_file(&content, var_name) {
            tracing::debug!(path = %env_file.display(), "API key taken from env file");
            return Ok(key);
        }
    }

    Err(PatentDraftError::config(format!(
        "API key not found. Set the {var_name} environment variable\n\
         or add a line `{var_name}=your-key` to {}",
        env_file.display()
    )))
}

/// Extract `name`'s value from `.env`-style content.
fn key_from_env_file(content: &str, name: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix(name)?.strip_prefix('='))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pd-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("GLM_API_KEY"));
        assert!(toml_str.contains("mammoth"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[generation]
model = "glm-4-plus"
temperature = 0.3

[claims]
strict_delimiter = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.generation.model, "glm-4-plus");
        assert_eq!(config.generation.max_tokens, 8192);
        assert_eq!(config.generation.api_key_env, "GLM_API_KEY");
        assert_eq!(config.convert.command, "mammoth");
        assert!(config.claims.strict_delimiter);
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = temp_dir();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[generation\nmodel = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn generation_config_validation() {
        let mut config = GenerationConfig::default();
        assert!(config.validate().is_ok());

        config.temperature = 1.5;
        assert!(config.validate().is_err());

        config.temperature = 0.0;
        config.base_url = "not a url".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid base_url"));
    }

    #[test]
    fn api_key_from_env_lookup() {
        let config = GenerationConfig::default();
        let dir = temp_dir();

        let key = discover_api_key(&config, &dir, |name| {
            (name == "GLM_API_KEY").then(|| " sk-env ".to_string())
        })
        .unwrap();
        assert_eq!(key, "sk-env");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_falls_back_to_env_file() {
        let config = GenerationConfig::default();
        let dir = temp_dir();
        std::fs::write(dir.join(".env"), "OTHER=1\nGLM_API_KEY= sk-file \n").unwrap();

        let key = discover_api_key(&config, &dir, |_| Some(String::new())).unwrap();
        assert_eq!(key, "sk-file");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_missing_everywhere() {
        let config = GenerationConfig::default();
        let dir = temp_dir();
        std::fs::write(dir.join(".env"), "GLM_API_KEY=\n").unwrap();

        let err = discover_api_key(&config, &dir, |_| None).unwrap_err();
        assert!(err.to_string().contains("API key not found"));
        assert!(err.to_string().contains("GLM_API_KEY"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_file_prefix_must_match_whole_name() {
        assert_eq!(key_from_env_file("GLM_API_KEY_OLD=x", "GLM_API_KEY"), None);
        assert_eq!(
            key_from_env_file("# comment\nGLM_API_KEY=abc=def", "GLM_API_KEY"),
            Some("abc=def".into())
        );
    }
}
