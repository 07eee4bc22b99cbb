//! Local situational context
//!
//! Holds who the assistant is talking to, what it is doing right now, and a
//! bounded history of recent commands. The control loop appends one record per
//! handled utterance; the router and prompt builders only read it.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::router::Args;

/// Function name recorded for remotely generated code
pub const GENERATED_CODE: &str = "generated_code";

/// What the assistant is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuraState {
    /// Waiting for a wake word
    #[default]
    Sleeping,
    /// Wake word heard, waiting for the command
    Listening,
    /// Routing and executing an utterance
    Processing,
    /// Playing back a response
    Speaking,
}

/// Interaction mode of the last routed utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuraMode {
    /// Device control
    #[default]
    Command,
    /// Open-ended chat
    Conversation,
}

/// One handled utterance
#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    /// Raw command text
    pub command: String,
    /// Resolved function, if any
    pub function: Option<String>,
    /// Arguments the function ran with
    pub args: Args,
    /// Whether handling succeeded
    pub success: bool,
    /// Short result or error string
    pub result: String,
    /// When the command was handled
    pub at: DateTime<Local>,
}

/// Situational context shared by the control loop and its collaborators
#[derive(Debug, Clone)]
pub struct LocalContext {
    /// How the assistant addresses the user
    pub user_name: String,
    /// Current lifecycle state
    pub current_state: AuraState,
    /// Mode of the last routed utterance
    pub current_mode: AuraMode,
    history: VecDeque<CommandRecord>,
    history_limit: usize,
}

impl LocalContext {
    /// Create a context that keeps at most `history_limit` records
    #[must_use]
    pub fn new(user_name: impl Into<String>, history_limit: usize) -> Self {
        let history_limit = history_limit.max(1);
        Self {
            user_name: user_name.into(),
            current_state: AuraState::default(),
            current_mode: AuraMode::default(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
        }
    }

    /// Append a handled command, evicting the oldest when full
    pub fn record_command(
        &mut self,
        command: &str,
        function: Option<&str>,
        args: Args,
        success: bool,
        result: impl Into<String>,
    ) {
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }

        let record = CommandRecord {
            command: command.to_string(),
            function: function.map(ToString::to_string),
            args,
            success,
            result: result.into(),
            at: Local::now(),
        };

        tracing::trace!(
            command = %record.command,
            function = ?record.function,
            success,
            "recorded command"
        );

        self.history.push_back(record);
    }

    /// Text of the most recent command
    #[must_use]
    pub fn last_command(&self) -> Option<&str> {
        self.history.back().map(|r| r.command.as_str())
    }

    /// Most recent record that ran a catalog function successfully
    #[must_use]
    pub fn last_successful(&self) -> Option<&CommandRecord> {
        self.history.iter().rev().find(|r| {
            r.success && r.function.as_deref().is_some_and(|f| f != GENERATED_CODE)
        })
    }

    /// History, oldest first
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &CommandRecord> {
        self.history.iter()
    }

    /// Number of records held
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for LocalContext {
    fn default() -> Self {
        Self::new("Sir", 20)
    }
}
