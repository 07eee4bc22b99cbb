//! TOML configuration file loading
//!
//! Supports `~/.config/aura/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AuraConfigFile {
    /// Assistant identity and wake words
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Confidence thresholds and savings estimate
    #[serde(default)]
    pub routing: RoutingFileConfig,

    /// Remote reasoning client
    #[serde(default)]
    pub remote: RemoteFileConfig,

    /// Local command execution
    #[serde(default)]
    pub executor: ExecutorFileConfig,
}

/// Assistant identity configuration
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// How the assistant addresses the user (e.g. "Sir")
    pub user_name: Option<String>,

    /// Assistant name used in the chat persona
    pub name: Option<String>,

    /// Wake words recognised in transcripts
    pub wake_words: Option<Vec<String>>,

    /// Number of past commands kept in context
    pub history_limit: Option<usize>,
}

/// Routing policy configuration
#[derive(Debug, Default, Deserialize)]
pub struct RoutingFileConfig {
    pub local_threshold: Option<f32>,
    pub intent_threshold: Option<f32>,
    pub tokens_saved_per_local: Option<u64>,
}

/// Remote reasoning configuration
#[derive(Debug, Default, Deserialize)]
pub struct RemoteFileConfig {
    /// Gemini API key
    pub api_key: Option<String>,

    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    pub intent_max_tokens: Option<u32>,
    pub intent_temperature: Option<f32>,
    pub chat_max_tokens: Option<u32>,
    pub chat_temperature: Option<f32>,
    pub code_max_tokens: Option<u32>,
    pub code_temperature: Option<f32>,
}

/// Local executor configuration
#[derive(Debug, Default, Deserialize)]
pub struct ExecutorFileConfig {
    /// Report actions without running them
    pub dry_run: Option<bool>,

    /// Allow running remotely generated code
    pub allow_generated_code: Option<bool>,

    /// Interpreter for generated code (e.g. "python3")
    pub interpreter: Option<String>,

    /// Root directory for `create_folder`
    pub workspace_dir: Option<String>,

    /// Subprocess timeout in seconds
    pub command_timeout_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AuraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AuraConfigFile {
    config_file_path().map_or_else(AuraConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files fall back to defaults.
pub fn load_config_from(path: &Path) -> AuraConfigFile {
    if !path.exists() {
        return AuraConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AuraConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AuraConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/aura/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("aura").join("config.toml"))
}
