//! Voice front end
//!
//! Speech-to-text and synthesis are external; this module covers the text
//! side of both: wake word matching on transcripts and the speaking sink.

mod speaker;
mod wake_word;

pub use speaker::{LogSpeaker, RecordingSpeaker, Speaker};
pub use wake_word::WakeWordDetector;
