//! Routing statistics

use std::fmt;

use serde::Serialize;

/// Per-route counters, monotonic for the life of the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Utterances executed locally
    pub local_commands: u64,
    /// Utterances sent for remote intent classification
    pub gemini_intent: u64,
    /// Utterances sent for remote code generation
    pub gemini_full: u64,
    /// Utterances answered by remote chat
    pub gemini_chat: u64,
    /// Static estimate of remote tokens avoided by local execution
    pub tokens_saved: u64,
}

impl Stats {
    /// Total routed utterances
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.local_commands + self.gemini_intent + self.gemini_full + self.gemini_chat
    }

    /// Derived view, recomputed on every call
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn report(&self) -> StatsReport {
        let total = self.total();
        let local_percentage = if total == 0 {
            0.0
        } else {
            self.local_commands as f64 / total as f64 * 100.0
        };

        StatsReport {
            local_commands: self.local_commands,
            gemini_intent: self.gemini_intent,
            gemini_full: self.gemini_full,
            gemini_chat: self.gemini_chat,
            tokens_saved: self.tokens_saved,
            total_commands: total,
            local_percentage,
            estimated_savings: format!("~{} tokens", self.tokens_saved),
        }
    }
}

/// Statistics snapshot with derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub local_commands: u64,
    pub gemini_intent: u64,
    pub gemini_full: u64,
    pub gemini_chat: u64,
    pub tokens_saved: u64,
    pub total_commands: u64,
    /// `local_commands / total_commands * 100`, zero when nothing was routed
    pub local_percentage: f64,
    /// Human-readable `tokens_saved`, e.g. `~1500 tokens`
    pub estimated_savings: String,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Aura Performance Statistics")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Local commands:     {} ({:.1}%)",
            self.local_commands, self.local_percentage
        )?;
        writeln!(f, "Gemini intent-only: {}", self.gemini_intent)?;
        writeln!(f, "Gemini full:        {}", self.gemini_full)?;
        writeln!(f, "Gemini chat:        {}", self.gemini_chat)?;
        writeln!(f, "Total commands:     {}", self.total_commands)?;
        writeln!(f, "Estimated savings:  {}", self.estimated_savings)?;
        write!(f, "{rule}")
    }
}
