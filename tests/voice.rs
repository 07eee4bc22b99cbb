//! Hands-free session integration tests
//!
//! Transcripts stand in for speech-to-text output; no audio involved

use std::sync::Arc;

use aura::session::{HandsFreeSession, SessionState, Turn};
use aura::voice::RecordingSpeaker;
use aura::{AuraState, Config, ControlLoop, KeywordRouter, WakeWordDetector};

mod common;

use common::{Call, RecordingExecutor};

fn session(executor: &Arc<RecordingExecutor>) -> HandsFreeSession<RecordingSpeaker> {
    let config = Config::default();
    let control = Arc::new(ControlLoop::new(
        &config,
        Box::new(KeywordRouter::new()),
        executor.clone(),
        None,
    ));
    let detector = WakeWordDetector::new(config.assistant.wake_words.iter().cloned()).unwrap();
    HandsFreeSession::new(control, detector, RecordingSpeaker::default())
}

#[tokio::test]
async fn test_inline_command_runs_immediately() {
    let executor = Arc::new(RecordingExecutor::default());
    let mut session = session(&executor);

    let turn = session
        .handle_transcript("Aura, take a screenshot")
        .await
        .unwrap();

    assert_eq!(turn, Turn::Responded("Screenshot taken, Sir.".to_string()));
    assert_eq!(session.state(), SessionState::Sleeping);
    assert_eq!(
        executor.calls(),
        [Call::Execute("take_screenshot".to_string(), Default::default())]
    );
    assert_eq!(session.speaker().lines(), ["Screenshot taken, Sir."]);
}

#[tokio::test]
async fn test_wake_word_alone_waits_for_command() {
    let executor = Arc::new(RecordingExecutor::default());
    let mut session = session(&executor);

    let turn = session.handle_transcript("hey aura").await.unwrap();
    assert_eq!(turn, Turn::Awaiting);
    assert_eq!(session.state(), SessionState::AwaitingCommand);
    assert_eq!(session.speaker().lines(), ["Yes, Sir?"]);
    assert!(executor.calls().is_empty());

    // No wake word needed for the follow-up
    let turn = session.handle_transcript("mute").await.unwrap();
    assert!(matches!(turn, Turn::Responded(_)));
    assert_eq!(session.state(), SessionState::Sleeping);
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn test_short_inline_command_waits() {
    let executor = Arc::new(RecordingExecutor::default());
    let mut session = session(&executor);

    let turn = session.handle_transcript("ok aura, go").await.unwrap();
    assert_eq!(turn, Turn::Awaiting);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_speech_without_wake_word_is_ignored() {
    let executor = Arc::new(RecordingExecutor::default());
    let mut session = session(&executor);

    for transcript in ["open chrome", "call laura tomorrow", "", "   "] {
        let turn = session.handle_transcript(transcript).await.unwrap();
        assert_eq!(turn, Turn::Ignored, "{transcript:?}");
    }
    assert!(executor.calls().is_empty());
    assert!(session.speaker().lines().is_empty());
    assert_eq!(session.state(), SessionState::Sleeping);
}

#[tokio::test]
async fn test_greeting_and_stats() {
    let executor = Arc::new(RecordingExecutor::default());
    let config = Config::default();
    let control = Arc::new(ControlLoop::new(
        &config,
        Box::new(KeywordRouter::new()),
        executor.clone(),
        None,
    ));
    let detector = WakeWordDetector::new(["aura"]).unwrap();
    let mut session = HandsFreeSession::new(Arc::clone(&control), detector, RecordingSpeaker::default());

    session.greet().await.unwrap();
    assert!(session.speaker().lines()[0].starts_with("Good "));

    session.handle_transcript("aura set volume to 40").await.unwrap();
    session.handle_transcript("aura what is rust").await.unwrap();

    let stats = control.stats();
    assert_eq!(stats.local_commands, 1);
    assert_eq!(stats.gemini_chat, 1);
    assert_eq!(control.context().current_state, AuraState::Sleeping);

    let lines = session.speaker().lines();
    assert_eq!(lines[1], "Volume set to 40 percent, Sir.");
    assert_eq!(lines[2], "I'm sorry, my conversation system is offline right now.");
}
