//! Aura - confidence-tiered voice assistant core
//!
//! Each utterance is classified locally, then handled by the cheapest tier
//! that can handle it:
//!
//! ```text
//! ┌──────────────┐   transcript   ┌──────────────────┐
//! │  Wake word   │ ─────────────▶ │   Control loop   │
//! └──────────────┘                └────────┬─────────┘
//!                                          │ classify (free)
//!                                 ┌────────▼─────────┐
//!                                 │  Keyword router  │
//!                                 └────────┬─────────┘
//!          ┌──────────────┬────────────────┼───────────────┐
//!          ▼              ▼                ▼               ▼
//!     local exec    remote intent     remote full     remote chat
//!     (0 tokens)    (~100 tokens)    (~500 tokens)   (~300 tokens)
//!          │              │                │               │
//!          └──────────────┴───────┬────────┴───────────────┘
//!                                 ▼
//!                        response / speaker
//! ```

pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod remote;
pub mod response;
pub mod router;
pub mod session;
pub mod stats;
pub mod tools;
pub mod voice;

pub use config::Config;
pub use context::{AuraMode, AuraState, LocalContext};
pub use control::{ControlLoop, Route};
pub use error::{Error, Result};
pub use remote::{GeminiClient, ReasoningClient};
pub use response::ResponseGenerator;
pub use router::{IntentRouter, KeywordRouter, MatchType, RouteResult};
pub use session::{HandsFreeSession, Turn};
pub use stats::StatsReport;
pub use tools::{CommandExecutor, ExecutionResult, SystemExecutor};
pub use voice::{LogSpeaker, Speaker, WakeWordDetector};
