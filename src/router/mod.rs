//! Local intent routing
//!
//! Classification is pure: no network, no side effects. That is what lets the
//! control loop treat a confident local match as free.

mod keyword;

use serde::Serialize;

use crate::context::LocalContext;

pub use keyword::KeywordRouter;

/// Function arguments keyed by parameter name
pub type Args = serde_json::Map<String, serde_json::Value>;

/// How the router arrived at its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// A known command phrasing matched
    LocalExact,
    /// Keyword overlap suggested a function
    LocalFuzzy,
    /// Nothing local matched
    None,
}

/// Classification of one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    /// The utterance as received
    pub raw_command: String,
    /// Best local function, if any
    pub function: Option<String>,
    /// Arguments for `function`
    pub args: Args,
    /// Certainty in `[0, 1]` that `function` is right
    pub confidence: f32,
    /// Utterance is conversation rather than a command
    pub is_conversation: bool,
    /// How the match was made
    pub match_type: MatchType,
}

impl RouteResult {
    /// A confident or fuzzy function match
    #[must_use]
    pub fn function(
        raw_command: &str,
        function: &str,
        args: Args,
        confidence: f32,
        match_type: MatchType,
    ) -> Self {
        Self {
            raw_command: raw_command.to_string(),
            function: Some(function.to_string()),
            args,
            confidence: confidence.clamp(0.0, 1.0),
            is_conversation: false,
            match_type,
        }
    }

    /// Conversational utterance
    #[must_use]
    pub fn conversation(raw_command: &str) -> Self {
        Self {
            raw_command: raw_command.to_string(),
            function: None,
            args: Args::new(),
            confidence: 0.0,
            is_conversation: true,
            match_type: MatchType::None,
        }
    }

    /// Nothing matched
    #[must_use]
    pub fn unmatched(raw_command: &str) -> Self {
        Self {
            raw_command: raw_command.to_string(),
            function: None,
            args: Args::new(),
            confidence: 0.0,
            is_conversation: false,
            match_type: MatchType::None,
        }
    }
}

/// Classifies free text into a local function or conversation
///
/// Confidence must be on one scale for every command: the control loop
/// compares it against fixed thresholds.
pub trait IntentRouter: Send + Sync {
    /// Classify `text`, reading (never mutating) `context`
    fn classify(&self, text: &str, context: &LocalContext) -> RouteResult;
}
