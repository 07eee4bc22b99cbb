//! Confidence-tiered control loop
//!
//! Each utterance takes exactly one route:
//!
//! | Route           | Condition                               | Remote cost |
//! |-----------------|-----------------------------------------|-------------|
//! | `RemoteChat`    | router flagged conversation             | chat call   |
//! | `LocalExec`     | confidence >= local threshold, function | none        |
//! | `RemoteIntent`  | confidence >= intent threshold          | small       |
//! | `RemoteFull`    | anything else                           | large       |
//!
//! A remote fault on the intent route falls back to the locally identified
//! function when there is one. Nothing raised by a collaborator reaches the
//! caller; every outcome is a sentence to speak.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{Config, RemoteConfig, RoutingConfig};
use crate::context::{AuraMode, AuraState, GENERATED_CODE, LocalContext};
use crate::remote::{
    CodeContext, GeminiClient, IntentReply, ReasoningClient, parse_intent_reply, prompt,
};
use crate::response::{
    CHAT_OFFLINE, CHAT_UNREACHABLE, ConfirmationContext, ResponseGenerator,
};
use crate::router::{Args, IntentRouter, KeywordRouter, RouteResult};
use crate::stats::{Stats, StatsReport};
use crate::tools::{CommandExecutor, SystemExecutor};
use crate::Result;

/// Handling tier chosen for one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the routed function locally
    LocalExec,
    /// Ask the remote client to classify the intent
    RemoteIntent,
    /// Ask the remote client to generate code
    RemoteFull,
    /// Ask the remote client for a conversational reply
    RemoteChat,
}

impl Route {
    /// Apply the routing policy, first match wins
    #[must_use]
    pub fn select(result: &RouteResult, policy: &RoutingConfig) -> Self {
        if result.is_conversation {
            Self::RemoteChat
        } else if result.confidence >= policy.local_threshold && result.function.is_some() {
            Self::LocalExec
        } else if result.confidence >= policy.intent_threshold {
            Self::RemoteIntent
        } else {
            Self::RemoteFull
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalExec => "local_exec",
            Self::RemoteIntent => "remote_intent",
            Self::RemoteFull => "remote_full",
            Self::RemoteChat => "remote_chat",
        })
    }
}

/// Remote call budgets
#[derive(Debug, Clone, Copy)]
struct Budgets {
    intent_max_tokens: u32,
    intent_temperature: f32,
    chat_max_tokens: u32,
    chat_temperature: f32,
}

impl From<&RemoteConfig> for Budgets {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            intent_max_tokens: config.intent_max_tokens,
            intent_temperature: config.intent_temperature,
            chat_max_tokens: config.chat_max_tokens,
            chat_temperature: config.chat_temperature,
        }
    }
}

/// The assistant's per-utterance dispatcher
///
/// Construct one per process and share it behind an `Arc`. Utterances are
/// handled one at a time in arrival order.
pub struct ControlLoop {
    router: Box<dyn IntentRouter>,
    executor: Arc<dyn CommandExecutor>,
    remote: Option<Arc<dyn ReasoningClient>>,
    responses: ResponseGenerator,
    policy: RoutingConfig,
    budgets: Budgets,
    assistant_name: String,
    context: Mutex<LocalContext>,
    stats: Mutex<Stats>,
    turn: tokio::sync::Mutex<()>,
}

impl ControlLoop {
    /// Assemble a loop from explicit collaborators
    ///
    /// `remote` is the capability flag: `None` means every remote route takes
    /// its unavailable fallback.
    #[must_use]
    pub fn new(
        config: &Config,
        router: Box<dyn IntentRouter>,
        executor: Arc<dyn CommandExecutor>,
        remote: Option<Arc<dyn ReasoningClient>>,
    ) -> Self {
        let user_name = config.assistant.user_name.clone();
        Self {
            router,
            executor,
            remote,
            responses: ResponseGenerator::new(user_name.clone()),
            policy: config.routing,
            budgets: Budgets::from(&config.remote),
            assistant_name: config.assistant.name.clone(),
            context: Mutex::new(LocalContext::new(
                user_name,
                config.assistant.history_limit,
            )),
            stats: Mutex::new(Stats::default()),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    /// Assemble the standard stack: keyword router, system executor, Gemini
    ///
    /// The remote client is built only when an API key is configured and
    /// `offline` is false.
    ///
    /// # Errors
    ///
    /// Returns error if the remote client cannot be constructed
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let remote: Option<Arc<dyn ReasoningClient>> = if offline || !config.has_remote() {
            tracing::info!(offline, "remote reasoning disabled");
            None
        } else {
            tracing::info!(model = %config.remote.model, "remote reasoning enabled");
            Some(Arc::new(GeminiClient::new(&config.remote)?))
        };

        Ok(Self::new(
            config,
            Box::new(KeywordRouter::new()),
            Arc::new(SystemExecutor::new(config.executor.clone())),
            remote,
        ))
    }

    /// Whether a remote reasoning client is configured
    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Response templates in use
    #[must_use]
    pub const fn responses(&self) -> &ResponseGenerator {
        &self.responses
    }

    /// Time-of-day greeting
    #[must_use]
    pub fn greeting(&self) -> String {
        self.responses.greeting()
    }

    /// Current statistics, derived fresh
    #[must_use]
    pub fn stats(&self) -> StatsReport {
        lock(&self.stats).report()
    }

    /// Copy of the current context
    #[must_use]
    pub fn context(&self) -> LocalContext {
        lock(&self.context).clone()
    }

    /// Update the lifecycle state
    pub fn set_state(&self, state: AuraState) {
        lock(&self.context).current_state = state;
    }

    /// Handle one utterance and return the text to speak
    ///
    /// Whitespace-only input returns an empty string without touching stats
    /// or context.
    pub async fn process_command(&self, command: &str) -> String {
        let command = command.trim();
        if command.is_empty() {
            return String::new();
        }

        let _turn = self.turn.lock().await;

        let route_result = {
            let mut ctx = lock(&self.context);
            ctx.current_state = AuraState::Processing;
            ctx.current_mode = AuraMode::Command;
            self.router.classify(command, &ctx)
        };

        let route = Route::select(&route_result, &self.policy);
        tracing::info!(
            %route,
            confidence = route_result.confidence,
            function = ?route_result.function,
            match_type = ?route_result.match_type,
            command,
            "routed utterance"
        );

        self.count(route);

        match route {
            Route::LocalExec => self.execute_local(&route_result).await,
            Route::RemoteIntent => self.handle_intent(command, &route_result).await,
            Route::RemoteFull => self.handle_full(command).await,
            Route::RemoteChat => self.chat_reply(command).await,
        }
    }

    /// Bump the selected route's counter
    fn count(&self, route: Route) {
        let mut stats = lock(&self.stats);
        match route {
            Route::LocalExec => {
                stats.local_commands += 1;
                stats.tokens_saved += self.policy.tokens_saved_per_local;
            }
            Route::RemoteIntent => stats.gemini_intent += 1,
            Route::RemoteFull => stats.gemini_full += 1,
            Route::RemoteChat => stats.gemini_chat += 1,
        }
    }

    async fn execute_local(&self, route_result: &RouteResult) -> String {
        match route_result.function.as_deref() {
            Some(function) => {
                self.run_function(&route_result.raw_command, function, &route_result.args)
                    .await
            }
            None => self.fail(
                &route_result.raw_command,
                "no function",
                self.responses.not_understood(),
            ),
        }
    }

    /// Execute a catalog function, record it, and phrase the outcome
    async fn run_function(&self, command: &str, function: &str, args: &Args) -> String {
        tracing::debug!(function, args = ?args, "executing function");
        let result = self.executor.execute(function, args).await;
        if !result.success {
            tracing::warn!(function, error = ?result.error, "function failed");
        }

        lock(&self.context).record_command(
            command,
            Some(function),
            args.clone(),
            result.success,
            result.summary(),
        );

        let ctx = ConfirmationContext::from_call(function, args);
        self.responses.confirmation(result.success, Some(&ctx))
    }

    async fn handle_intent(&self, command: &str, route_result: &RouteResult) -> String {
        let Some(remote) = self.remote.as_deref() else {
            tracing::info!("intent route without remote client, trying local");
            return self
                .local_fallback(route_result, self.responses.not_understood())
                .await;
        };

        let prompt = prompt::intent_prompt(command);
        let reply = remote
            .complete_intent(
                &prompt,
                self.budgets.intent_max_tokens,
                self.budgets.intent_temperature,
            )
            .await;

        match reply {
            Ok(text) => match parse_intent_reply(&text) {
                IntentReply::Execute { function, args } => {
                    tracing::info!(function = %function, "remote resolved intent");
                    self.run_function(command, &function, &args).await
                }
                IntentReply::Conversation => self.chat_reply(command).await,
                IntentReply::Unparsed => {
                    tracing::debug!(reply = %text, "unparsed intent reply, treating as chat");
                    self.chat_reply(command).await
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "intent classification failed");
                self.local_fallback(route_result, self.responses.failure())
                    .await
            }
        }
    }

    /// Run the locally identified function, or answer with `otherwise`
    async fn local_fallback(&self, route_result: &RouteResult, otherwise: String) -> String {
        match route_result.function.as_deref() {
            Some(function) => {
                tracing::info!(function, "falling back to local execution");
                self.run_function(&route_result.raw_command, function, &route_result.args)
                    .await
            }
            None => self.fail(&route_result.raw_command, "remote unavailable", otherwise),
        }
    }

    async fn handle_full(&self, command: &str) -> String {
        let Some(remote) = self.remote.as_deref() else {
            return self.fail(command, "remote unavailable", self.responses.not_understood());
        };

        let context = CodeContext {
            last_command: lock(&self.context).last_command().map(ToString::to_string),
        };

        match remote.generate_code(command, &context).await {
            Ok(Some(code)) => {
                tracing::debug!(lines = code.lines().count(), "running generated code");
                let result = self.executor.execute_raw(&code).await;
                if !result.success {
                    tracing::warn!(error = ?result.error, "generated code failed");
                }
                lock(&self.context).record_command(
                    command,
                    Some(GENERATED_CODE),
                    Args::new(),
                    result.success,
                    result.summary(),
                );
                self.responses.confirmation(result.success, None)
            }
            Ok(None) => {
                tracing::info!("remote generated no code");
                self.fail(command, "no code generated", self.responses.failure())
            }
            Err(e) => {
                tracing::warn!(error = %e, "code generation failed");
                self.fail(command, &e.to_string(), self.responses.failure())
            }
        }
    }

    /// Remote chat reply; records context only when a remote client exists
    async fn chat_reply(&self, message: &str) -> String {
        lock(&self.context).current_mode = AuraMode::Conversation;

        let Some(remote) = self.remote.as_deref() else {
            tracing::info!("chat requested without remote client");
            return CHAT_OFFLINE.to_string();
        };

        let prompt = prompt::chat_prompt(&self.assistant_name, message);
        let reply = remote
            .complete_chat(
                &prompt,
                self.budgets.chat_max_tokens,
                self.budgets.chat_temperature,
            )
            .await
            .map(|text| text.trim().to_string());

        match reply {
            Ok(text) if !text.is_empty() => {
                lock(&self.context).record_command(message, None, Args::new(), true, text.as_str());
                text
            }
            Ok(_) => self.fail(message, "empty chat reply", CHAT_UNREACHABLE.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.fail(message, &e.to_string(), CHAT_UNREACHABLE.to_string())
            }
        }
    }

    /// Record a failed utterance and return `reply`
    fn fail(&self, command: &str, reason: &str, reply: String) -> String {
        lock(&self.context).record_command(command, None, Args::new(), false, reason);
        reply
    }
}

/// Lock a std mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
