//! Local command execution
//!
//! The executor never raises: every failure is captured in
//! [`ExecutionResult::error`] so the control loop can phrase it.

pub mod catalog;
pub mod executor;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::router::Args;

pub use catalog::{CATALOG, FunctionSpec, ParamKind, ParamSpec, lookup};
pub use executor::SystemExecutor;

/// Outcome of one executor invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Whether the action completed
    pub success: bool,
    /// Payload on success
    pub result: Option<Value>,
    /// Failure reason
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Successful outcome with a payload
    #[must_use]
    pub fn ok(result: impl Into<Value>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// Failed outcome
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Short summary for the context history
    #[must_use]
    pub fn summary(&self) -> String {
        if self.success {
            match &self.result {
                Some(Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => String::new(),
            }
        } else {
            self.error.clone().unwrap_or_default()
        }
    }
}

/// Runs catalog functions and generated code
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a catalog function with validated arguments
    async fn execute(&self, function: &str, args: &Args) -> ExecutionResult;

    /// Run an opaque generated snippet
    async fn execute_raw(&self, code: &str) -> ExecutionResult;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn summary_prefers_payload_or_error() {
        assert_eq!(ExecutionResult::ok("muted").summary(), "muted");
        assert_eq!(ExecutionResult::ok(json!(42)).summary(), "42");
        assert_eq!(ExecutionResult::failed("boom").summary(), "boom");
    }
}
