//! Spoken output sink

use std::sync::Mutex;

use async_trait::async_trait;

use crate::Result;

/// Text-to-speech playback
///
/// Synthesis itself is out of scope; implementations hand text to whatever
/// engine the platform provides.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak `text`, returning once playback is done
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Speaker that logs and prints each line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

#[async_trait]
impl Speaker for LogSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::info!("AURA: {text}");
        println!("AURA: {text}");
        Ok(())
    }
}

/// Speaker that keeps every line, for inspecting a session
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    lines: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    /// Lines spoken so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "recorded speech");
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }
}
