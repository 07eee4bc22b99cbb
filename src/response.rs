//! Spoken response templates
//!
//! Every phrase is deterministic and addressed to the user by name. Missing
//! context fields fall back to generic phrasing; nothing here can fail.

use chrono::{Local, Timelike};
use serde_json::Value;

use crate::router::Args;

/// Reply when remote chat is not configured
pub const CHAT_OFFLINE: &str = "I'm sorry, my conversation system is offline right now.";

/// Reply when a remote chat call fails
pub const CHAT_UNREACHABLE: &str = "I'm having trouble connecting right now.";

/// Details that sharpen a confirmation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationContext {
    /// Function that ran
    pub function: Option<String>,
    /// Numeric level, if the call had one
    pub value: Option<i64>,
    /// Target application name
    pub app: Option<String>,
    /// Created folder name
    pub name: Option<String>,
}

impl ConfirmationContext {
    /// Pull the phrasing-relevant fields out of a call
    #[must_use]
    pub fn from_call(function: &str, args: &Args) -> Self {
        let text = |key: &str| args.get(key).and_then(Value::as_str).map(ToString::to_string);
        Self {
            function: Some(function.to_string()),
            value: args.get("level").and_then(Value::as_i64),
            app: text("app_name"),
            name: text("folder_name"),
        }
    }
}

/// Builds short spoken sentences
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    user_name: String,
}

impl ResponseGenerator {
    /// Create a generator addressing `user_name`
    #[must_use]
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    /// Name used to address the user
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Confirmation for a finished action
    #[must_use]
    pub fn confirmation(&self, success: bool, ctx: Option<&ConfirmationContext>) -> String {
        let user = &self.user_name;
        let ctx = ctx.cloned().unwrap_or_default();

        if !success {
            return match ctx.app {
                Some(app) => format!("Sorry {user}, I couldn't do that with {app}."),
                None => format!("Sorry {user}, I couldn't do that."),
            };
        }

        let level = |what: &str| match ctx.value {
            Some(v) => format!("{what} set to {v} percent, {user}."),
            None => format!("{what} updated, {user}."),
        };

        match ctx.function.as_deref() {
            Some("set_brightness") => level("Brightness"),
            Some("set_system_volume") => level("Volume"),
            Some("adjust_brightness") => format!("Brightness adjusted, {user}."),
            Some("adjust_volume") => format!("Volume adjusted, {user}."),
            Some("mute_system_volume") => format!("Muted, {user}."),
            Some("unmute_system_volume") => format!("Sound is back on, {user}."),
            Some("open_application") => match ctx.app {
                Some(app) => format!("Opening {app}, {user}."),
                None => format!("Opening it now, {user}."),
            },
            Some("close_application") => match ctx.app {
                Some(app) => format!("Closed {app}, {user}."),
                None => format!("Closed, {user}."),
            },
            Some("create_folder") => match ctx.name {
                Some(name) => format!("Folder {name} created, {user}."),
                None => format!("Folder created, {user}."),
            },
            Some("take_screenshot") => format!("Screenshot taken, {user}."),
            Some("lock_workstation") => format!("Locking the computer, {user}."),
            Some("play_youtube_video_ultra_direct") => format!("Playing it now, {user}."),
            _ => format!("Done, {user}."),
        }
    }

    /// Time-of-day greeting for the current local hour
    #[must_use]
    pub fn greeting(&self) -> String {
        self.greeting_at(Local::now().hour())
    }

    /// Time-of-day greeting for `hour` in `0..24`
    #[must_use]
    pub fn greeting_at(&self, hour: u32) -> String {
        let part = match hour {
            0..12 => "morning",
            12..17 => "afternoon",
            _ => "evening",
        };
        format!("Good {part}, {}. How can I help?", self.user_name)
    }

    /// Short acknowledgment that a command was heard
    #[must_use]
    pub fn acknowledgment(&self) -> String {
        format!("Yes, {}?", self.user_name)
    }

    /// Reply when nothing could make sense of the command
    #[must_use]
    pub fn not_understood(&self) -> String {
        format!("I'm sorry {}, I didn't understand that.", self.user_name)
    }

    /// Reply when handling failed outright
    #[must_use]
    pub fn failure(&self) -> String {
        format!(
            "Sorry {}, something went wrong with that request.",
            self.user_name
        )
    }
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new("Sir")
    }
}
