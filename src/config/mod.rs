//! Configuration management for the Aura assistant
//!
//! Values resolve as `env > TOML file > default`, then get normalised so the
//! routing policy always sees a consistent pair of thresholds.

pub mod file;

use std::path::PathBuf;

use file::AuraConfigFile;

/// Default wake words, including common mis-transcriptions of "aura"
pub const DEFAULT_WAKE_WORDS: &[&str] = &["aura", "hey aura", "ok aura", "ora", "or a"];

/// Default Gemini model (fastest, cheapest)
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Aura configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Identity, wake words, history retention
    pub assistant: AssistantConfig,

    /// Confidence-tier routing policy
    pub routing: RoutingConfig,

    /// Remote reasoning client
    pub remote: RemoteConfig,

    /// Local command execution
    pub executor: ExecutorConfig,
}

/// Assistant identity configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// How the assistant addresses the user
    pub user_name: String,

    /// Name used in the chat persona
    pub name: String,

    /// Wake words recognised in transcripts
    pub wake_words: Vec<String>,

    /// Number of past commands kept in context
    pub history_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            user_name: "Sir".to_string(),
            name: "Aura".to_string(),
            wake_words: DEFAULT_WAKE_WORDS.iter().map(ToString::to_string).collect(),
            history_limit: 20,
        }
    }
}

/// Routing policy configuration
#[derive(Debug, Clone, Copy)]
pub struct RoutingConfig {
    /// Minimum confidence for free local execution
    pub local_threshold: f32,

    /// Minimum confidence for the cheap remote intent call
    pub intent_threshold: f32,

    /// Static estimate of remote tokens avoided per local execution.
    ///
    /// This is a reporting constant, not a measured token count.
    pub tokens_saved_per_local: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            local_threshold: 0.85,
            intent_threshold: 0.50,
            tokens_saved_per_local: 500,
        }
    }
}

/// Remote reasoning configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Gemini API key; `None` means no remote client is constructed
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Token cap for intent classification
    pub intent_max_tokens: u32,

    /// Temperature for intent classification
    pub intent_temperature: f32,

    /// Token cap for chat replies
    pub chat_max_tokens: u32,

    /// Temperature for chat replies
    pub chat_temperature: f32,

    /// Token cap for code generation
    pub code_max_tokens: u32,

    /// Temperature for code generation
    pub code_temperature: f32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            intent_max_tokens: 100,
            intent_temperature: 0.1,
            chat_max_tokens: 150,
            chat_temperature: 0.7,
            code_max_tokens: 500,
            code_temperature: 0.2,
        }
    }
}

/// Local executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Report actions without running them
    pub dry_run: bool,

    /// Allow running remotely generated code
    pub allow_generated_code: bool,

    /// Interpreter that receives generated code on stdin
    pub interpreter: String,

    /// Root directory for `create_folder`
    pub workspace_dir: PathBuf,

    /// Subprocess timeout in seconds
    pub command_timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            allow_generated_code: true,
            interpreter: "python3".to_string(),
            workspace_dir: default_workspace_dir(),
            command_timeout_secs: 30,
        }
    }
}

/// Default folder-creation root: desktop, then home, then cwd
/// `value` unless it is NaN or infinite
const fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() { value } else { default }
}

fn default_workspace_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from("."),
        |d| {
            d.desktop_dir()
                .map_or_else(|| d.home_dir().to_path_buf(), std::path::Path::to_path_buf)
        },
    )
}

impl Config {
    /// Load configuration from the process environment and the standard TOML file
    #[must_use]
    pub fn load() -> Self {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// `env` is consulted first for every value that has an environment override.
    #[must_use]
    pub fn from_sources(fc: AuraConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str| {
            non_empty(key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        };

        let assistant = AssistantConfig {
            user_name: non_empty("AURA_USER_NAME")
                .or(fc.assistant.user_name)
                .unwrap_or(defaults.assistant.user_name),
            name: fc.assistant.name.unwrap_or(defaults.assistant.name),
            wake_words: fc
                .assistant
                .wake_words
                .unwrap_or(defaults.assistant.wake_words),
            history_limit: fc
                .assistant
                .history_limit
                .unwrap_or(defaults.assistant.history_limit),
        };

        let routing = RoutingConfig {
            local_threshold: fc
                .routing
                .local_threshold
                .unwrap_or(defaults.routing.local_threshold),
            intent_threshold: fc
                .routing
                .intent_threshold
                .unwrap_or(defaults.routing.intent_threshold),
            tokens_saved_per_local: fc
                .routing
                .tokens_saved_per_local
                .unwrap_or(defaults.routing.tokens_saved_per_local),
        };

        let r = fc.remote;
        let d = defaults.remote;
        let remote = RemoteConfig {
            api_key: non_empty("GEMINI_API_KEY").or(r.api_key),
            model: non_empty("AURA_MODEL").or(r.model).unwrap_or(d.model),
            base_url: r.base_url.unwrap_or(d.base_url),
            timeout_secs: r.timeout_secs.unwrap_or(d.timeout_secs),
            intent_max_tokens: r.intent_max_tokens.unwrap_or(d.intent_max_tokens),
            intent_temperature: r.intent_temperature.unwrap_or(d.intent_temperature),
            chat_max_tokens: r.chat_max_tokens.unwrap_or(d.chat_max_tokens),
            chat_temperature: r.chat_temperature.unwrap_or(d.chat_temperature),
            code_max_tokens: r.code_max_tokens.unwrap_or(d.code_max_tokens),
            code_temperature: r.code_temperature.unwrap_or(d.code_temperature),
        };

        let e = fc.executor;
        let executor = ExecutorConfig {
            dry_run: flag("AURA_DRY_RUN")
                .or(e.dry_run)
                .unwrap_or(defaults.executor.dry_run),
            allow_generated_code: e
                .allow_generated_code
                .unwrap_or(defaults.executor.allow_generated_code),
            interpreter: e.interpreter.unwrap_or(defaults.executor.interpreter),
            workspace_dir: e
                .workspace_dir
                .map_or(defaults.executor.workspace_dir, PathBuf::from),
            command_timeout_secs: e
                .command_timeout_secs
                .unwrap_or(defaults.executor.command_timeout_secs),
        };

        let mut config = Self {
            assistant,
            routing,
            remote,
            executor,
        };
        config.normalize();
        config
    }

    /// Clamp values into the ranges the control loop relies on
    pub fn normalize(&mut self) {
        let routing = RoutingConfig::default();
        let remote = RemoteConfig::default();

        self.routing.local_threshold =
            finite_or(self.routing.local_threshold, routing.local_threshold).clamp(0.0, 1.0);
        self.routing.intent_threshold =
            finite_or(self.routing.intent_threshold, routing.intent_threshold)
                .clamp(0.0, self.routing.local_threshold);

        self.remote.intent_temperature =
            finite_or(self.remote.intent_temperature, remote.intent_temperature).clamp(0.0, 2.0);
        self.remote.chat_temperature =
            finite_or(self.remote.chat_temperature, remote.chat_temperature).clamp(0.0, 2.0);
        self.remote.code_temperature =
            finite_or(self.remote.code_temperature, remote.code_temperature).clamp(0.0, 2.0);
        self.remote.timeout_secs = self.remote.timeout_secs.max(1);
        self.remote.api_key = self
            .remote
            .api_key
            .as_ref()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self.remote.base_url = self.remote.base_url.trim_end_matches('/').to_string();

        self.assistant.history_limit = self.assistant.history_limit.max(1);
        self.assistant.wake_words = self
            .assistant
            .wake_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if self.assistant.wake_words.is_empty() {
            self.assistant.wake_words = DEFAULT_WAKE_WORDS.iter().map(ToString::to_string).collect();
        }

        self.executor.command_timeout_secs = self.executor.command_timeout_secs.max(1);
    }

    /// Whether a remote reasoning client can be constructed
    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use file::{RemoteFileConfig, RoutingFileConfig};

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_routing_policy() {
        let config = Config::from_sources(AuraConfigFile::default(), no_env);
        assert!((config.routing.local_threshold - 0.85).abs() < f32::EPSILON);
        assert!((config.routing.intent_threshold - 0.50).abs() < f32::EPSILON);
        assert_eq!(config.routing.tokens_saved_per_local, 500);
        assert_eq!(config.assistant.user_name, "Sir");
        assert!(!config.has_remote());
    }

    #[test]
    fn env_overrides_file() {
        let fc = AuraConfigFile {
            remote: RemoteFileConfig {
                api_key: Some("from-file".to_string()),
                model: Some("gemini-file".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = Config::from_sources(fc, |key| match key {
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            "AURA_DRY_RUN" => Some("yes".to_string()),
            _ => None,
        });

        assert_eq!(config.remote.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.remote.model, "gemini-file");
        assert!(config.executor.dry_run);
        assert!(config.has_remote());
    }

    #[test]
    fn blank_api_key_means_no_remote() {
        let fc = AuraConfigFile {
            remote: RemoteFileConfig {
                api_key: Some("   ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = Config::from_sources(fc, no_env);
        assert!(!config.has_remote());
    }

    #[test]
    fn thresholds_are_clamped_and_ordered() {
        let fc = AuraConfigFile {
            routing: RoutingFileConfig {
                local_threshold: Some(1.7),
                intent_threshold: Some(1.2),
                tokens_saved_per_local: None,
            },
            ..Default::default()
        };
        let config = Config::from_sources(fc, no_env);
        assert!((config.routing.local_threshold - 1.0).abs() < f32::EPSILON);
        assert!(config.routing.intent_threshold <= config.routing.local_threshold);
    }

    #[test]
    fn non_finite_values_fall_back_to_defaults() {
        let fc: AuraConfigFile = toml::from_str(
            "[routing]\nlocal_threshold = nan\nintent_threshold = inf\n\n[remote]\nchat_temperature = nan\n",
        )
        .unwrap();
        let config = Config::from_sources(fc, no_env);
        let defaults = Config::default();

        assert!(
            (config.routing.local_threshold - defaults.routing.local_threshold).abs() < f32::EPSILON
        );
        assert!(
            (config.routing.intent_threshold - defaults.routing.intent_threshold).abs()
                < f32::EPSILON
        );
        assert!(
            (config.remote.chat_temperature - defaults.remote.chat_temperature).abs()
                < f32::EPSILON
        );
    }

    #[test]
    fn wake_words_are_normalized() {
        let mut config = Config::default();
        config.assistant.wake_words = vec!["  Hey AURA ".to_string(), String::new()];
        config.normalize();
        assert_eq!(config.assistant.wake_words, vec!["hey aura".to_string()]);
    }
}
