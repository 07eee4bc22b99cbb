//! Keyword and phrase-pattern router

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use super::{Args, IntentRouter, MatchType, RouteResult};
use crate::context::LocalContext;
use crate::tools::catalog::{CATALOG, FunctionSpec, ParamKind};

/// Confidence for a fixed phrasing with no free-text capture
const EXACT: f32 = 0.95;

/// Confidence for a fixed phrasing around a free-text capture
const EXACT_OPEN: f32 = 0.90;

/// Fuzzy confidence is `FUZZY_BASE + FUZZY_SPAN * overlap`; stays below the local tier
const FUZZY_BASE: f32 = 0.35;
const FUZZY_SPAN: f32 = 0.45;

/// Default step for "turn it up" style commands
const STEP: i64 = 10;

type Resolve = fn(&Captures<'_>) -> Option<(&'static str, Args)>;

struct Pattern {
    regex: Regex,
    confidence: f32,
    match_type: MatchType,
    resolve: Resolve,
}

fn exact(re: &str, confidence: f32, resolve: Resolve) -> Pattern {
    Pattern {
        regex: Regex::new(re).expect("valid regex"),
        confidence,
        match_type: MatchType::LocalExact,
        resolve,
    }
}

fn fuzzy(re: &str, confidence: f32, resolve: Resolve) -> Pattern {
    Pattern {
        match_type: MatchType::LocalFuzzy,
        ..exact(re, confidence, resolve)
    }
}

/// Ordered: the first matching pattern wins
static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        exact(
            r"^(?:set |change |make |put )?(?:the )?(?:screen )?brightness (?:to |at )?(\d{1,3})(?: ?%| percent)?$",
            EXACT,
            |c| Some(("set_brightness", int_arg(c, "level"))),
        ),
        exact(
            r"^(?:set |change |make |put |turn )?(?:the )?(?:system )?(?:volume|sound) (?:to |at )?(\d{1,3})(?: ?%| percent)?$",
            EXACT,
            |c| Some(("set_system_volume", int_arg(c, "level"))),
        ),
        exact(
            r"^(?:turn|crank|bring|put) (up|down) (?:the )?(volume|sound|brightness)$",
            EXACT,
            adjust,
        ),
        exact(
            r"^(?:turn |crank |bring |put )?(?:the )?(volume|sound|brightness) (up|down)$",
            EXACT,
            adjust,
        ),
        exact(
            r"^(increase|raise|decrease|lower|reduce) (?:the )?(volume|sound|brightness)$",
            EXACT,
            adjust,
        ),
        exact(
            r"^(?:make it |a bit )?(louder|quieter|brighter|dimmer|darker)$",
            EXACT,
            adjust,
        ),
        exact(
            r"^(?:mute|silence)(?: (?:the )?(?:volume|sound|audio|computer|speakers))?$",
            EXACT,
            |_| Some(("mute_system_volume", Args::new())),
        ),
        exact(
            r"^unmute(?: (?:the )?(?:volume|sound|audio|computer|speakers))?$",
            EXACT,
            |_| Some(("unmute_system_volume", Args::new())),
        ),
        exact(
            r"^(?:(?:take|grab|capture|get) (?:a |the )?(?:screenshot|screen shot|screen capture)|screenshot)$",
            EXACT,
            |_| Some(("take_screenshot", Args::new())),
        ),
        exact(
            r"^(?:open|launch|start) (?:the |my )?(?:camera|webcam)(?: app)?$",
            EXACT,
            |_| Some(("open_camera_app", Args::new())),
        ),
        exact(
            r"^lock (?:the |my )?(?:computer|screen|workstation|pc|laptop|session)$",
            EXACT,
            |_| Some(("lock_workstation", Args::new())),
        ),
        exact(
            r"^(hide|show) (?:the |my |all )?desktop icons$",
            EXACT,
            |c| {
                let function = if &c[1] == "hide" {
                    "hide_desktop_icons"
                } else {
                    "show_desktop_icons"
                };
                Some((function, Args::new()))
            },
        ),
        exact(
            r"^(?:turn (on|off) (?:the )?night ?light|turn (?:the )?night ?light (on|off)|(enable|disable) (?:the )?night ?light)$",
            EXACT,
            |c| Some(("toggle_night_light", toggle_arg(c))),
        ),
        exact(
            r"^(?:turn (on|off) (?:the )?(?:airplane|flight) mode|turn (?:the )?(?:airplane|flight) mode (on|off)|(enable|disable) (?:the )?(?:airplane|flight) mode)$",
            EXACT,
            |c| Some(("toggle_airplane_mode_advanced", toggle_arg(c))),
        ),
        exact(
            r"^(?:what time is it|whats the time|what is the time|tell me the time|(?:the )?current time)$",
            EXACT,
            |_| Some(("tell_time", Args::new())),
        ),
        exact(r"^play (.+?) on youtube$", 0.92, |c| {
            Some(("play_youtube_video_ultra_direct", text_arg(c, "search_term")))
        }),
        exact(r"^(?:search )?youtube (?:for )?(.+)$", EXACT_OPEN, |c| {
            Some(("play_youtube_video_ultra_direct", text_arg(c, "search_term")))
        }),
        exact(
            r"^(?:create|make) (?:a )?(?:new )?(?:folder|directory) (?:named |called )?(.+)$",
            0.92,
            |c| Some(("create_folder", text_arg(c, "folder_name"))),
        ),
        exact(
            r"^(?:create|make) (?:a )?(?:new )?(?:powerpoint )?(?:presentation|slide deck|slides|deck) (?:about|on|for) (.+)$",
            0.92,
            |c| Some(("create_powerpoint_presentation", text_arg(c, "topic"))),
        ),
        exact(
            r"^(?:open|launch|start|run) (?:the |up )?(\S+(?: \S+){0,2}?)(?: app| application)?$",
            EXACT_OPEN,
            |c| Some(("open_application", app_arg(c)?)),
        ),
        exact(
            r"^(?:close|quit|exit|kill) (?:the )?(\S+(?: \S+){0,2}?)(?: app| application)?$",
            EXACT_OPEN,
            |c| Some(("close_application", app_arg(c)?)),
        ),
        fuzzy(r"^play (.+)$", 0.70, |c| {
            Some(("play_youtube_video_ultra_direct", text_arg(c, "search_term")))
        }),
    ]
});

static REPEAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:again|do (?:that|it) again|repeat (?:that|it)|one more time)$")
        .expect("valid regex")
});

/// Openers that mark small talk or open questions
const CONVERSATION_OPENERS: &[&str] = &[
    "what is",
    "what are",
    "whats",
    "what do you",
    "who",
    "why",
    "how do",
    "how does",
    "how are you",
    "how is",
    "tell me",
    "explain",
    "describe",
    "do you",
    "are you",
    "can you tell",
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "good night",
    "thank",
    "thanks",
];

const POLITE_PREFIXES: &[&str] = &["please ", "can you ", "could you ", "would you ", "kindly "];
const POLITE_SUFFIXES: &[&str] = &[" please", " for me", " now"];

/// Words ignored when measuring keyword overlap
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "to", "my", "me", "it", "of", "on", "in", "and", "is", "this", "that", "i",
    "you", "for", "with", "bit", "some",
];

/// Pure phrase-pattern and keyword router
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordRouter;

impl KeywordRouter {
    /// Create a router
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl IntentRouter for KeywordRouter {
    fn classify(&self, text: &str, context: &LocalContext) -> RouteResult {
        let cleaned = strip_politeness(&normalize(text));
        if cleaned.is_empty() {
            return RouteResult::unmatched(text);
        }

        for pattern in PATTERNS.iter() {
            if let Some(caps) = pattern.regex.captures(&cleaned)
                && let Some((function, args)) = (pattern.resolve)(&caps)
            {
                return RouteResult::function(
                    text,
                    function,
                    args,
                    pattern.confidence,
                    pattern.match_type,
                );
            }
        }

        if REPEAT.is_match(&cleaned)
            && let Some(last) = context.last_successful()
            && let Some(function) = last.function.as_deref()
        {
            return RouteResult::function(
                text,
                function,
                last.args.clone(),
                EXACT_OPEN,
                MatchType::LocalExact,
            );
        }

        if is_conversational(&cleaned) || text.trim_end().ends_with('?') {
            return RouteResult::conversation(text);
        }

        keyword_match(text, &cleaned)
    }
}

/// Lowercase, drop apostrophes, turn other punctuation into spaces, collapse whitespace
fn normalize(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| if c.is_alphanumeric() || c == '%' { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_politeness(text: &str) -> String {
    let mut out = text;
    loop {
        let before = out;
        for prefix in POLITE_PREFIXES {
            out = out.strip_prefix(prefix).unwrap_or(out);
        }
        for suffix in POLITE_SUFFIXES {
            out = out.strip_suffix(suffix).unwrap_or(out);
        }
        if out == before {
            return out.to_string();
        }
    }
}

fn is_conversational(cleaned: &str) -> bool {
    CONVERSATION_OPENERS.iter().any(|opener| {
        cleaned
            .strip_prefix(opener)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    })
}

/// Best keyword overlap against the catalog
#[allow(clippy::cast_precision_loss)]
fn keyword_match(raw: &str, cleaned: &str) -> RouteResult {
    let tokens: Vec<&str> = cleaned
        .split(' ')
        .filter(|t| !STOPWORDS.contains(t))
        .collect();
    if tokens.is_empty() {
        return RouteResult::unmatched(raw);
    }

    let mut best: Option<(&FunctionSpec, usize)> = None;
    for spec in CATALOG {
        let hits = tokens.iter().filter(|t| spec.keywords.contains(t)).count();
        if hits > 0 && best.is_none_or(|(_, h)| hits > h) {
            best = Some((spec, hits));
        }
    }

    let Some((spec, hits)) = best else {
        return RouteResult::unmatched(raw);
    };

    let overlap = hits as f32 / tokens.len() as f32;
    let confidence = FUZZY_SPAN.mul_add(overlap, FUZZY_BASE);
    RouteResult::function(
        raw,
        spec.name,
        fuzzy_args(spec, &tokens),
        confidence,
        MatchType::LocalFuzzy,
    )
}

/// Arguments that can be read straight off the tokens
fn fuzzy_args(spec: &FunctionSpec, tokens: &[&str]) -> Args {
    let mut args = Args::new();
    for p in spec.params {
        let value = match p.kind {
            ParamKind::Level => tokens
                .iter()
                .find_map(|t| t.trim_end_matches('%').parse::<i64>().ok())
                .map(Value::from),
            ParamKind::Change => tokens.iter().find_map(|t| direction(t)).map(Value::from),
            ParamKind::Toggle => tokens.iter().find_map(|t| match *t {
                "on" | "enable" => Some(Value::Bool(true)),
                "off" | "disable" => Some(Value::Bool(false)),
                _ => None,
            }),
            ParamKind::Text => None,
        };
        if let Some(value) = value {
            args.insert(p.name.to_string(), value);
        }
    }
    args
}

fn direction(word: &str) -> Option<i64> {
    match word {
        "up" | "increase" | "raise" | "louder" | "brighter" => Some(STEP),
        "down" | "decrease" | "lower" | "reduce" | "quieter" | "dimmer" | "darker" => Some(-STEP),
        _ => None,
    }
}

fn captured<'t>(c: &'t Captures<'_>) -> impl Iterator<Item = &'t str> {
    c.iter().skip(1).flatten().map(|m| m.as_str())
}

fn adjust(c: &Captures<'_>) -> Option<(&'static str, Args)> {
    let words: Vec<&str> = captured(c).collect();
    let change = words.iter().find_map(|w| direction(w))?;
    let function = if words
        .iter()
        .any(|w| matches!(*w, "volume" | "sound" | "louder" | "quieter"))
    {
        "adjust_volume"
    } else {
        "adjust_brightness"
    };

    let mut args = Args::new();
    args.insert("change".to_string(), Value::from(change));
    Some((function, args))
}

fn int_arg(c: &Captures<'_>, key: &str) -> Args {
    let mut args = Args::new();
    if let Some(n) = c.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) {
        args.insert(key.to_string(), Value::from(n));
    }
    args
}

fn text_arg(c: &Captures<'_>, key: &str) -> Args {
    let mut args = Args::new();
    if let Some(m) = c.get(1) {
        args.insert(key.to_string(), Value::String(m.as_str().trim().to_string()));
    }
    args
}

/// An application name is a short span with no filler words
fn app_arg(c: &Captures<'_>) -> Option<Args> {
    let name = c.get(1)?.as_str();
    if name.split_whitespace().any(|w| STOPWORDS.contains(&w)) {
        return None;
    }
    Some(text_arg(c, "app_name"))
}

fn toggle_arg(c: &Captures<'_>) -> Args {
    let mut args = Args::new();
    if let Some(word) = captured(c).next() {
        args.insert(
            "enable".to_string(),
            Value::Bool(matches!(word, "on" | "enable")),
        );
    }
    args
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn classify(text: &str) -> RouteResult {
        KeywordRouter::new().classify(text, &LocalContext::default())
    }

    #[test]
    fn set_brightness_is_exact() {
        let r = classify("set brightness to 50");
        assert_eq!(r.function.as_deref(), Some("set_brightness"));
        assert_eq!(r.args.get("level"), Some(&json!(50)));
        assert!(r.confidence >= 0.85);
        assert_eq!(r.match_type, MatchType::LocalExact);
        assert_eq!(r.raw_command, "set brightness to 50");
    }

    #[test]
    fn common_commands_route_locally() {
        let cases = [
            ("turn up the volume", "adjust_volume"),
            ("Mute", "mute_system_volume"),
            ("open chrome", "open_application"),
            ("Take a screenshot.", "take_screenshot"),
            ("what time is it", "tell_time"),
            ("play despacito on youtube", "play_youtube_video_ultra_direct"),
            ("create folder named test", "create_folder"),
            ("open the camera", "open_camera_app"),
            ("please lock the computer", "lock_workstation"),
            ("hide desktop icons", "hide_desktop_icons"),
            ("turn the night light off", "toggle_night_light"),
        ];

        for (text, function) in cases {
            let r = classify(text);
            assert_eq!(r.function.as_deref(), Some(function), "{text}");
            assert!(r.confidence >= 0.85, "{text}: {}", r.confidence);
            assert!(!r.is_conversation, "{text}");
        }
    }

    #[test]
    fn captures_arguments() {
        assert_eq!(classify("open chrome").args["app_name"], json!("chrome"));
        assert_eq!(
            classify("play despacito on youtube").args["search_term"],
            json!("despacito")
        );
        assert_eq!(classify("create folder named test").args["folder_name"], json!("test"));
        assert_eq!(classify("turn the volume down").args["change"], json!(-10));
        assert_eq!(classify("turn the night light off").args["enable"], json!(false));
        assert_eq!(classify("enable airplane mode").args["enable"], json!(true));
        assert_eq!(classify("brighter").function.as_deref(), Some("adjust_brightness"));
    }

    #[test]
    fn questions_are_conversation() {
        for text in ["what is machine learning", "how are you", "tell me a joke", "is it raining?"] {
            let r = classify(text);
            assert!(r.is_conversation, "{text}");
            assert!(r.function.is_none());
        }
    }

    #[test]
    fn open_requires_a_short_app_name() {
        let r = classify("open visual studio code");
        assert_eq!(r.function.as_deref(), Some("open_application"));
        assert_eq!(r.args["app_name"], json!("visual studio code"));
        assert_eq!(classify("launch spotify app").args["app_name"], json!("spotify"));
        assert_eq!(classify("close the calculator").args["app_name"], json!("calculator"));

        for text in ["run a backup of my documents", "start backing up my photos", "close it"] {
            let r = classify(text);
            assert!(r.confidence < 0.85, "{text}: {}", r.confidence);
            assert_ne!(r.match_type, MatchType::LocalExact, "{text}");
        }
    }

    #[test]
    fn fuzzy_match_stays_below_local_tier() {
        let r = classify("make the screen brighter somehow");
        assert_eq!(r.match_type, MatchType::LocalFuzzy);
        assert_eq!(r.function.as_deref(), Some("adjust_brightness"));
        assert!(r.confidence >= 0.50 && r.confidence < 0.85, "{}", r.confidence);
        assert_eq!(r.args["change"], json!(10));
    }

    #[test]
    fn play_without_service_is_fuzzy() {
        let r = classify("play despacito");
        assert_eq!(r.match_type, MatchType::LocalFuzzy);
        assert!(r.confidence < 0.85);
    }

    #[test]
    fn unrelated_text_is_unmatched() {
        let r = classify("write a python script that sorts files by date");
        assert_eq!(r.match_type, MatchType::None);
        assert!(r.function.is_none());
        assert!(r.confidence < 0.50);
        assert!(!r.is_conversation);
    }

    #[test]
    fn repeat_uses_last_successful_command() {
        let mut ctx = LocalContext::default();
        let router = KeywordRouter::new();

        let r = router.classify("do that again", &ctx);
        assert!(r.function.is_none());

        let mut args = Args::new();
        args.insert("level".to_string(), json!(30));
        ctx.record_command("set brightness to 30", Some("set_brightness"), args, true, "ok");

        let r = router.classify("do that again", &ctx);
        assert_eq!(r.function.as_deref(), Some("set_brightness"));
        assert_eq!(r.args["level"], json!(30));
        assert!(r.confidence >= 0.85);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize("  What's   the TIME?! "), "whats the time");
        assert_eq!(normalize("Set volume to 40%."), "set volume to 40%");
        assert_eq!(strip_politeness("please open chrome for me please"), "open chrome");
    }
}
