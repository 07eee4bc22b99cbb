//! Wake word detection
//!
//! Works on transcripts rather than audio: speech-to-text runs upstream and
//! hands over text. Wake words match on whole words only, so "aura" does not
//! fire inside "laura".

use crate::{Error, Result};

/// A normalised transcript word and the byte offset where it ends
struct Word {
    text: String,
    end: usize,
}

/// Detects wake words in transcripts
#[derive(Debug, Clone)]
pub struct WakeWordDetector {
    wake_words: Vec<String>,
    tokenized: Vec<Vec<String>>,
}

impl WakeWordDetector {
    /// Create a new wake word detector
    ///
    /// # Arguments
    ///
    /// * `wake_words` - Wake words to detect (e.g., "hey aura")
    ///
    /// # Errors
    ///
    /// Returns error if no non-empty wake word is given
    pub fn new(wake_words: impl IntoIterator<Item = impl Into<String>>) -> Result<Self> {
        let mut pairs: Vec<(String, Vec<String>)> = wake_words
            .into_iter()
            .map(|w| w.into().to_lowercase().trim().to_string())
            .filter(|w| !w.is_empty())
            .map(|w| {
                let tokens: Vec<String> = words(&w).into_iter().map(|t| t.text).collect();
                (w, tokens)
            })
            .filter(|(_, tokens)| !tokens.is_empty())
            .collect();

        if pairs.is_empty() {
            return Err(Error::Config("at least one wake word required".to_string()));
        }

        // Longest first so "hey aura" wins over "aura" at the same position
        pairs.sort_by_key(|(_, tokens)| std::cmp::Reverse(tokens.len()));
        let (wake_words, tokenized) = pairs.into_iter().unzip();

        tracing::debug!(wake_words = ?wake_words, "wake word detector initialized");

        Ok(Self {
            wake_words,
            tokenized,
        })
    }

    /// Byte offset just past the earliest wake word in `transcript`
    fn find(&self, transcript: &str) -> Option<(usize, &str)> {
        let words = words(transcript);
        for start in 0..words.len() {
            for (wake, tokens) in self.wake_words.iter().zip(&self.tokenized) {
                let end = start + tokens.len();
                if end <= words.len()
                    && words[start..end]
                        .iter()
                        .zip(tokens)
                        .all(|(w, t)| &w.text == t)
                {
                    return Some((words[end - 1].end, wake.as_str()));
                }
            }
        }
        None
    }

    /// Check if transcribed text contains a wake word
    #[must_use]
    pub fn check_wake_word(&self, transcript: &str) -> bool {
        match self.find(transcript) {
            Some((_, wake_word)) => {
                tracing::info!(wake_word, transcript, "wake word detected");
                true
            }
            None => false,
        }
    }

    /// Text following the first wake word, leading punctuation trimmed
    ///
    /// Returns `None` when the transcript has no wake word and an empty string
    /// when the wake word was said alone.
    #[must_use]
    pub fn extract_command(&self, transcript: &str) -> Option<String> {
        let (end, _) = self.find(transcript)?;
        Some(
            transcript[end..]
                .trim_start_matches(|c: char| {
                    c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?')
                })
                .trim_end()
                .to_string(),
        )
    }

    /// Get the configured wake words, longest first
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}

/// Split into lowercase alphanumeric words, apostrophes dropped
fn words(text: &str) -> Vec<Word> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        let is_word = c.is_alphanumeric() || c == '\'';
        match (is_word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(word(text, s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(word(text, s, text.len()));
    }
    out.retain(|w| !w.text.is_empty());
    out
}

fn word(text: &str, start: usize, end: usize) -> Word {
    Word {
        text: text[start..end].to_lowercase().replace('\'', ""),
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> WakeWordDetector {
        WakeWordDetector::new(crate::config::DEFAULT_WAKE_WORDS.iter().copied()).unwrap()
    }

    #[test]
    fn test_wake_word_detection() {
        let detector = WakeWordDetector::new(["hey aura"]).unwrap();

        assert!(!detector.check_wake_word("hello world"));
        assert!(detector.check_wake_word("Hey Aura, what's up?"));
    }

    #[test]
    fn whole_words_only() {
        let detector = detector();
        assert!(!detector.check_wake_word("call laura tomorrow"));
        assert!(!detector.check_wake_word("the oracle said"));
        assert!(detector.check_wake_word("ora open chrome"));
    }

    #[test]
    fn test_extract_command() {
        let detector = detector();
        assert_eq!(
            detector.extract_command("Hey Aura, what's the weather?").as_deref(),
            Some("what's the weather?")
        );
        assert_eq!(
            detector.extract_command("Aura set brightness to 50").as_deref(),
            Some("set brightness to 50")
        );
        assert_eq!(detector.extract_command("Hey Aura").as_deref(), Some(""));
        assert_eq!(detector.extract_command("open chrome"), None);
    }

    #[test]
    fn longest_wake_word_wins() {
        let detector = detector();
        assert_eq!(detector.wake_words()[0].split(' ').count(), 2);
        assert_eq!(
            detector.extract_command("ok aura mute").as_deref(),
            Some("mute")
        );
    }

    #[test]
    fn requires_a_wake_word() {
        assert!(WakeWordDetector::new(["  "]).is_err());
        assert!(WakeWordDetector::new(Vec::<String>::new()).is_err());
    }
}
