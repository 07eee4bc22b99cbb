//! Prompt builders and the lenient intent-reply parser

use serde::Deserialize;
use serde_json::Value;

use super::CodeContext;
use crate::router::Args;
use crate::tools::catalog::CATALOG;

/// Bounded classification prompt listing every catalog signature
#[must_use]
pub fn intent_prompt(command: &str) -> String {
    let functions: Vec<String> = CATALOG.iter().map(|f| f.signature()).collect();
    format!(
        "Classify this command. Available functions: {}\n\n\
         Command: \"{command}\"\n\n\
         Respond with JSON only:\n\
         {{\"intent\": \"function|conversation|unknown\", \"function\": \"function_name_or_null\", \"args\": {{}}, \"confidence\": 0.0-1.0}}",
        functions.join(", ")
    )
}

/// Persona prompt for a conversational reply
#[must_use]
pub fn chat_prompt(assistant_name: &str, message: &str) -> String {
    format!(
        "You are {assistant_name}, a helpful AI assistant with a warm, professional personality.\n\
         Be concise (under 50 words unless asked for detail).\n\n\
         User: {message}"
    )
}

/// Code-generation prompt for commands no catalog function covers
#[must_use]
pub fn code_prompt(command: &str, context: &CodeContext) -> String {
    let mut prompt = String::from(
        "Write a short, self-contained Python 3 script that performs the user's request \
         on their desktop computer. Reply with the code only, no explanation.\n\n",
    );
    if let Some(last) = context.last_command.as_deref() {
        prompt.push_str(&format!("Previous command: \"{last}\"\n"));
    }
    prompt.push_str(&format!("Request: \"{command}\""));
    prompt
}

/// Interpreted intent-classification reply
#[derive(Debug, Clone, PartialEq)]
pub enum IntentReply {
    /// Run a named function
    Execute {
        /// Function name as returned (not yet checked against the catalog)
        function: String,
        /// Arguments as returned
        args: Args,
    },
    /// Model judged the command conversational
    Conversation,
    /// Reply had no usable structure
    Unparsed,
}

#[derive(Deserialize)]
struct RawIntent {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    function: Option<Value>,
    #[serde(default)]
    args: Option<Value>,
}

/// Parse a classification reply
///
/// Takes the first `{` through the last `}` so surrounding prose or code
/// fences are tolerated. Never fails: anything that does not parse is
/// [`IntentReply::Unparsed`].
#[must_use]
pub fn parse_intent_reply(text: &str) -> IntentReply {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return IntentReply::Unparsed;
    };
    if end < start {
        return IntentReply::Unparsed;
    }

    let raw: RawIntent = match serde_json::from_str(&text[start..=end]) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "intent reply is not valid JSON");
            return IntentReply::Unparsed;
        }
    };

    let function = raw
        .function
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("null"));

    if let Some(function) = function {
        let args = match raw.args {
            Some(Value::Object(map)) => map,
            _ => Args::new(),
        };
        return IntentReply::Execute {
            function: function.to_string(),
            args,
        };
    }

    if raw.intent.as_deref() == Some("conversation") {
        IntentReply::Conversation
    } else {
        IntentReply::Unparsed
    }
}
