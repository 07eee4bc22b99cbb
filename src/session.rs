//! Hands-free session over a stream of transcripts

use std::sync::Arc;

use crate::Result;
use crate::context::AuraState;
use crate::control::ControlLoop;
use crate::voice::{Speaker, WakeWordDetector};

/// Inline commands must be longer than this to run without a follow-up
const MIN_INLINE_COMMAND_CHARS: usize = 3;

/// Where the session is in the wake/command cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Waiting for a wake word
    #[default]
    Sleeping,
    /// Wake word heard alone; the next transcript is the command
    AwaitingCommand,
}

/// What one transcript led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Nothing to do (no wake word, or blank)
    Ignored,
    /// Wake word acknowledged, waiting for the command
    Awaiting,
    /// A command ran and this was spoken
    Responded(String),
}

/// Drives the control loop from transcripts
pub struct HandsFreeSession<S> {
    control: Arc<ControlLoop>,
    detector: WakeWordDetector,
    speaker: S,
    state: SessionState,
}

impl<S: Speaker> HandsFreeSession<S> {
    /// Create a session in the sleeping state
    #[must_use]
    pub fn new(control: Arc<ControlLoop>, detector: WakeWordDetector, speaker: S) -> Self {
        control.set_state(AuraState::Sleeping);
        Self {
            control,
            detector,
            speaker,
            state: SessionState::Sleeping,
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The speaker in use
    #[must_use]
    pub const fn speaker(&self) -> &S {
        &self.speaker
    }

    /// Speak the greeting
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    pub async fn greet(&self) -> Result<()> {
        self.say(&self.control.greeting()).await
    }

    /// Feed one transcript
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    pub async fn handle_transcript(&mut self, transcript: &str) -> Result<Turn> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Ok(Turn::Ignored);
        }

        match self.state {
            SessionState::AwaitingCommand => {
                tracing::info!(command = transcript, "command received");
                self.state = SessionState::Sleeping;
                self.respond(transcript).await
            }
            SessionState::Sleeping => {
                let Some(command) = self.detector.extract_command(transcript) else {
                    tracing::trace!(transcript, "no wake word");
                    return Ok(Turn::Ignored);
                };

                if command.chars().count() > MIN_INLINE_COMMAND_CHARS {
                    tracing::info!(command = %command, "inline command");
                    self.respond(&command).await
                } else {
                    self.state = SessionState::AwaitingCommand;
                    self.say(&self.control.responses().acknowledgment()).await?;
                    self.control.set_state(AuraState::Listening);
                    Ok(Turn::Awaiting)
                }
            }
        }
    }

    async fn respond(&self, command: &str) -> Result<Turn> {
        let response = self.control.process_command(command).await;
        if response.is_empty() {
            self.control.set_state(AuraState::Sleeping);
            return Ok(Turn::Ignored);
        }

        self.say(&response).await?;
        self.control.set_state(AuraState::Sleeping);
        Ok(Turn::Responded(response))
    }

    async fn say(&self, text: &str) -> Result<()> {
        self.control.set_state(AuraState::Speaking);
        self.speaker.speak(text).await
    }
}
