//! Remote reasoning client
//!
//! Three call shapes, all fallible: a bounded intent classification, code
//! generation for commands no local function covers, and free chat.

mod gemini;
pub mod prompt;

use async_trait::async_trait;

use crate::Result;

pub use gemini::GeminiClient;
pub use prompt::{IntentReply, parse_intent_reply};

/// Situational grounding for code generation
#[derive(Debug, Clone, Default)]
pub struct CodeContext {
    /// Most recent command, if any
    pub last_command: Option<String>,
}

/// Remote language-model endpoint
///
/// Any call may fail with a transport or timeout error; callers treat every
/// failure as recoverable.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Bounded, low-temperature completion for intent classification
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is empty
    async fn complete_intent(&self, prompt: &str, max_tokens: u32, temperature: f32)
    -> Result<String>;

    /// Generate an executable snippet for `command`
    ///
    /// Returns `Ok(None)` when the model produced nothing usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    async fn generate_code(&self, command: &str, context: &CodeContext) -> Result<Option<String>>;

    /// Natural-language reply
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is empty
    async fn complete_chat(&self, prompt: &str, max_tokens: u32, temperature: f32)
    -> Result<String>;
}
