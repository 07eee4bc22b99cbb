//! Shared test utilities
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aura::config::Config;
use aura::context::LocalContext;
use aura::remote::{CodeContext, ReasoningClient};
use aura::router::{Args, IntentRouter, MatchType, RouteResult};
use aura::tools::{CommandExecutor, ExecutionResult};
use aura::{ControlLoop, Error, Result};

/// Router that returns a fixed classification for every utterance
pub struct FixedRouter {
    function: Option<String>,
    args: Args,
    confidence: f32,
    conversation: bool,
}

impl FixedRouter {
    /// Classify everything as `function` at `confidence`
    pub fn function(function: &str, args: Args, confidence: f32) -> Self {
        Self {
            function: Some(function.to_string()),
            args,
            confidence,
            conversation: false,
        }
    }

    /// Classify everything as unmatched at `confidence`
    pub fn unmatched(confidence: f32) -> Self {
        Self {
            function: None,
            args: Args::new(),
            confidence,
            conversation: false,
        }
    }

    /// Classify everything as conversation, with a misleading confidence
    pub fn conversation(confidence: f32) -> Self {
        Self {
            function: None,
            args: Args::new(),
            confidence,
            conversation: true,
        }
    }
}

impl IntentRouter for FixedRouter {
    fn classify(&self, text: &str, _context: &LocalContext) -> RouteResult {
        let mut result = match &self.function {
            Some(f) => RouteResult::function(
                text,
                f,
                self.args.clone(),
                self.confidence,
                MatchType::LocalFuzzy,
            ),
            None => RouteResult::unmatched(text),
        };
        result.confidence = self.confidence;
        result.is_conversation = self.conversation;
        result
    }
}

/// One recorded executor call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(String, Args),
    Raw(String),
}

/// Executor that records calls and returns a fixed outcome
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    fail: bool,
}

impl RecordingExecutor {
    /// Executor whose calls all fail
    pub fn failing() -> Self {
        Self {
            calls: Mutex::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn outcome(&self) -> ExecutionResult {
        if self.fail {
            ExecutionResult::failed("device busy")
        } else {
            ExecutionResult::ok("ok")
        }
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, function: &str, args: &Args) -> ExecutionResult {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Execute(function.to_string(), args.clone()));
        self.outcome()
    }

    async fn execute_raw(&self, code: &str) -> ExecutionResult {
        self.calls.lock().unwrap().push(Call::Raw(code.to_string()));
        self.outcome()
    }
}

/// Which remote entry point was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    Intent,
    Code,
    Chat,
}

/// Remote client with canned replies; `None` replies fail with a transport error
#[derive(Default)]
pub struct ScriptedRemote {
    pub intent: Option<String>,
    pub code: Option<Option<String>>,
    pub chat: Option<String>,
    pub(crate) calls: Mutex<Vec<RemoteCall>>,
    pub(crate) prompts: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    /// Remote whose every call fails
    pub fn down() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn note(&self, call: RemoteCall, prompt: &str) {
        self.calls.lock().unwrap().push(call);
        self.prompts.lock().unwrap().push(prompt.to_string());
    }
}

fn transport_error() -> Error {
    Error::Remote("connection reset".to_string())
}

#[async_trait]
impl ReasoningClient for ScriptedRemote {
    async fn complete_intent(&self, prompt: &str, _max: u32, _temp: f32) -> Result<String> {
        self.note(RemoteCall::Intent, prompt);
        self.intent.clone().ok_or_else(transport_error)
    }

    async fn generate_code(&self, command: &str, context: &CodeContext) -> Result<Option<String>> {
        let prompt = format!("{command} | last: {:?}", context.last_command);
        self.note(RemoteCall::Code, &prompt);
        self.code.clone().ok_or_else(transport_error)
    }

    async fn complete_chat(&self, prompt: &str, _max: u32, _temp: f32) -> Result<String> {
        self.note(RemoteCall::Chat, prompt);
        self.chat.clone().ok_or_else(transport_error)
    }
}

/// Arguments from a JSON object literal
pub fn args(value: serde_json::Value) -> Args {
    value.as_object().cloned().unwrap_or_default()
}

/// A control loop over the given fakes, default config
pub fn control(
    router: impl IntentRouter + 'static,
    executor: &Arc<RecordingExecutor>,
    remote: Option<&Arc<ScriptedRemote>>,
) -> ControlLoop {
    let executor: Arc<dyn CommandExecutor> = executor.clone();
    let remote = remote.map(|r| {
        let r: Arc<dyn ReasoningClient> = r.clone();
        r
    });
    ControlLoop::new(&Config::default(), Box::new(router), executor, remote)
}
