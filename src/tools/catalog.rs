//! Closed catalog of local device-control functions
//!
//! The catalog is the single source of truth for which functions exist, what
//! arguments they take, and how those arguments are validated. The executor
//! validates against it and the intent prompt lists its signatures.

use serde_json::Value;

use crate::router::Args;
use crate::{Error, Result};

/// Kind of a function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Integer percentage in `0..=100`
    Level,
    /// Signed integer step in `-100..=100`
    Change,
    /// Boolean toggle
    Toggle,
    /// Non-empty free text
    Text,
}

/// Parameter of a catalog function
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Argument key
    pub name: &'static str,
    /// Validation rule
    pub kind: ParamKind,
}

/// A local function the assistant can run without remote help
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    /// Function name as routed
    pub name: &'static str,
    /// Ordered parameters
    pub params: &'static [ParamSpec],
    /// One-line description
    pub description: &'static str,
    /// Words that hint at this function in free text
    pub keywords: &'static [&'static str],
}

const fn param(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec { name, kind }
}

const LEVEL: &[ParamSpec] = &[param("level", ParamKind::Level)];
const CHANGE: &[ParamSpec] = &[param("change", ParamKind::Change)];
const ENABLE: &[ParamSpec] = &[param("enable", ParamKind::Toggle)];
const APP: &[ParamSpec] = &[param("app_name", ParamKind::Text)];
const NONE: &[ParamSpec] = &[];

/// Every function the executor accepts
pub const CATALOG: &[FunctionSpec] = &[
    FunctionSpec {
        name: "set_system_volume",
        params: LEVEL,
        description: "Set the output volume to a percentage",
        keywords: &["volume", "sound", "set", "level", "percent"],
    },
    FunctionSpec {
        name: "adjust_volume",
        params: CHANGE,
        description: "Raise or lower the output volume",
        keywords: &["volume", "sound", "louder", "quieter", "up", "down", "increase", "decrease"],
    },
    FunctionSpec {
        name: "mute_system_volume",
        params: NONE,
        description: "Mute audio output",
        keywords: &["mute", "silence", "quiet"],
    },
    FunctionSpec {
        name: "unmute_system_volume",
        params: NONE,
        description: "Unmute audio output",
        keywords: &["unmute", "sound", "back"],
    },
    FunctionSpec {
        name: "set_brightness",
        params: LEVEL,
        description: "Set screen brightness to a percentage",
        keywords: &["brightness", "screen", "bright", "set", "percent"],
    },
    FunctionSpec {
        name: "adjust_brightness",
        params: CHANGE,
        description: "Raise or lower screen brightness",
        keywords: &["brightness", "brighter", "dimmer", "dim", "up", "down", "screen"],
    },
    FunctionSpec {
        name: "open_application",
        params: APP,
        description: "Launch an application",
        keywords: &["open", "launch", "start", "run", "app", "application"],
    },
    FunctionSpec {
        name: "close_application",
        params: APP,
        description: "Close a running application",
        keywords: &["close", "quit", "exit", "kill", "app", "application"],
    },
    FunctionSpec {
        name: "take_screenshot",
        params: NONE,
        description: "Capture the screen",
        keywords: &["screenshot", "capture", "screen", "snap"],
    },
    FunctionSpec {
        name: "open_camera_app",
        params: NONE,
        description: "Open the camera",
        keywords: &["camera", "webcam", "photo", "selfie"],
    },
    FunctionSpec {
        name: "lock_workstation",
        params: NONE,
        description: "Lock the session",
        keywords: &["lock", "computer", "screen", "workstation", "pc"],
    },
    FunctionSpec {
        name: "hide_desktop_icons",
        params: NONE,
        description: "Hide desktop icons",
        keywords: &["hide", "desktop", "icons"],
    },
    FunctionSpec {
        name: "show_desktop_icons",
        params: NONE,
        description: "Show desktop icons",
        keywords: &["show", "desktop", "icons"],
    },
    FunctionSpec {
        name: "toggle_night_light",
        params: ENABLE,
        description: "Turn the night light on or off",
        keywords: &["night", "light", "blue", "warm"],
    },
    FunctionSpec {
        name: "toggle_airplane_mode_advanced",
        params: ENABLE,
        description: "Turn airplane mode on or off",
        keywords: &["airplane", "flight", "mode", "wireless", "radio"],
    },
    FunctionSpec {
        name: "play_youtube_video_ultra_direct",
        params: &[param("search_term", ParamKind::Text)],
        description: "Play a YouTube search result",
        keywords: &["play", "youtube", "video", "song", "music", "watch"],
    },
    FunctionSpec {
        name: "create_folder",
        params: &[param("folder_name", ParamKind::Text)],
        description: "Create a folder in the workspace",
        keywords: &["create", "make", "new", "folder", "directory"],
    },
    FunctionSpec {
        name: "create_powerpoint_presentation",
        params: &[param("topic", ParamKind::Text)],
        description: "Start a presentation on a topic",
        keywords: &["presentation", "powerpoint", "slides", "deck"],
    },
    FunctionSpec {
        name: "tell_time",
        params: NONE,
        description: "Say the current time",
        keywords: &["time", "clock", "hour"],
    },
];

/// Look up a function by name
#[must_use]
pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    CATALOG.iter().find(|f| f.name == name)
}

impl FunctionSpec {
    /// Signature as shown to the remote classifier, e.g. `set_brightness(level)`
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.name).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Validate and coerce arguments against this function's parameters
    ///
    /// Unknown keys are dropped; missing or out-of-range values are rejected.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for the first parameter that fails.
    pub fn validate(&self, args: &Args) -> Result<Args> {
        let mut out = Args::new();
        for p in self.params {
            let raw = args.get(p.name).ok_or_else(|| Error::InvalidArgument {
                name: p.name.to_string(),
                reason: "missing".to_string(),
            })?;
            out.insert(p.name.to_string(), coerce(p, raw)?);
        }
        Ok(out)
    }
}

fn coerce(p: &ParamSpec, raw: &Value) -> Result<Value> {
    let invalid = |reason: &str| Error::InvalidArgument {
        name: p.name.to_string(),
        reason: reason.to_string(),
    };

    match p.kind {
        ParamKind::Level | ParamKind::Change => {
            let n = as_integer(raw).ok_or_else(|| invalid("expected an integer"))?;
            let (lo, hi) = if p.kind == ParamKind::Level {
                (0, 100)
            } else {
                (-100, 100)
            };
            if !(lo..=hi).contains(&n) {
                return Err(invalid(&format!("must be between {lo} and {hi}")));
            }
            Ok(Value::from(n))
        }
        ParamKind::Toggle => as_toggle(raw)
            .map(Value::Bool)
            .ok_or_else(|| invalid("expected on/off")),
        ParamKind::Text => raw
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| invalid("expected non-empty text")),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn as_toggle(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "yes" | "enable" | "1" => Some(true),
            "off" | "false" | "no" | "disable" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}
