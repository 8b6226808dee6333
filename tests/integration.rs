use autonomous_program::{
    ai::{MockChatClient, MockImageVariationClient},
    app::{App, AppServices, RunSettings},
    dialogue::{
        ConversationState, DialogueSession, Encoder, HistoryWindow, MessagesEncoder, MockBackend,
        RecordingSink, Role, RunnerOutput, ScriptedInput, SessionPhase, SessionRunner,
        TranscriptEncoder, Turn,
    },
    ebook::EbookGenerator,
    photo::PhotoGenerator,
    Error,
};
use image::{Rgb, RgbImage};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn transcript_session(backend: MockBackend) -> DialogueSession {
    DialogueSession::new(Box::new(TranscriptEncoder::new()), Box::new(backend))
}

#[tokio::test]
async fn test_two_turn_conversation_with_fixed_reply() {
    let mut session = transcript_session(MockBackend::new().echoing_context_with("OK"));
    let mut input = ScriptedInput::new(["hello", "how are you"]);
    let mut sink = RecordingSink::new();

    let report = SessionRunner::run(&mut session, 2, &mut input, &mut sink).await;

    assert!(report.is_complete());
    assert_eq!(sink.replies(), vec!["OK", "OK"]);
    assert_eq!(
        session.state().turns(),
        &[
            Turn::user("hello"),
            Turn::assistant("OK"),
            Turn::user("how are you"),
            Turn::assistant("OK"),
        ]
    );
}

#[tokio::test]
async fn test_backend_failure_on_second_call_commits_only_first_turn() {
    let backend = MockBackend::new()
        .with_response("OK".to_string())
        .with_failure_on_call(2);
    let mut session = transcript_session(backend);
    let mut input = ScriptedInput::new(["hello", "how are you"]);
    let mut sink = RecordingSink::new();

    let report = SessionRunner::run(&mut session, 2, &mut input, &mut sink).await;

    assert_eq!(report.completed, 1);
    assert_eq!(sink.outputs().len(), 2);
    assert_eq!(sink.outputs()[0], RunnerOutput::Reply("OK".to_string()));
    assert!(matches!(&sink.outputs()[1], RunnerOutput::Error(msg) if msg.contains("Backend")));
    assert_eq!(session.state().len(), 2);
}

#[tokio::test]
async fn test_history_length_is_twice_completed_turns() {
    let mut session = transcript_session(MockBackend::new());

    for k in 1..=5 {
        session.advance(&format!("line {}", k)).await.unwrap();
        assert_eq!(session.state().len(), 2 * k);
        assert_eq!(session.turns_taken(), k);
    }
}

#[tokio::test]
async fn test_encoded_history_round_trips() {
    let mut session = transcript_session(MockBackend::new());
    for line in ["hi", "", "tell me a joke"] {
        session.advance(line).await.unwrap();
    }

    let state: &ConversationState = session.state();
    for encoder in [
        Box::new(TranscriptEncoder::new()) as Box<dyn Encoder>,
        Box::new(MessagesEncoder::new().with_system_prompt("system")) as Box<dyn Encoder>,
    ] {
        let decoded = encoder.decode(&encoder.encode(state.turns())).unwrap();
        assert_eq!(decoded.len(), state.len());
        assert_eq!(decoded, state.turns());
    }
}

#[tokio::test]
async fn test_zero_turn_run_touches_nothing() {
    let backend = MockBackend::new();
    let observer = backend.clone();
    let mut session = transcript_session(backend);
    let mut sink = RecordingSink::new();

    let mut input = ScriptedInput::new(["x"]);

    let report = SessionRunner::run(&mut session, 0, &mut input, &mut sink).await;

    assert_eq!(report.completed, 0);
    assert_eq!(observer.get_call_count(), 0);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.state().is_empty());
    assert_eq!(input.remaining(), 1);
}

#[tokio::test]
async fn test_reply_repeating_user_text_is_kept_whole() {
    let mut session = transcript_session(MockBackend::new().with_response("OK".to_string()));
    let mut input = ScriptedInput::new(["O", "OK"]);
    let mut sink = RecordingSink::new();

    let report = SessionRunner::run(&mut session, 2, &mut input, &mut sink).await;

    assert!(report.is_complete());
    assert_eq!(sink.replies(), vec!["OK", "OK"]);
    assert_eq!(session.state().turns()[1], Turn::assistant("OK"));
}

#[tokio::test]
async fn test_turn_limited_session_refuses_extra_turns() {
    let mut session = transcript_session(MockBackend::new()).with_turn_limit(1);
    session.advance("one").await.unwrap();

    let err = session.advance("two").await.unwrap_err();
    assert!(matches!(err, Error::SessionFinished(1)));
    assert_eq!(session.phase(), SessionPhase::Done);
}

#[tokio::test]
async fn test_windowed_session_keeps_full_history() {
    let backend = MockBackend::new().with_response("sure".to_string());
    let mut session = DialogueSession::new(Box::new(MessagesEncoder::new()), Box::new(backend))
        .with_window(HistoryWindow::LastExchanges(1));

    for line in ["a", "b", "c", "d"] {
        session.advance(line).await.unwrap();
    }

    assert_eq!(session.state().len(), 8);
    assert_eq!(session.state().turns()[0].role(), Role::User);
    assert_eq!(session.state().turns()[0].text(), "a");
}

#[tokio::test]
async fn test_app_with_services_runs_all_stages() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("photo.png");
    RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]))
        .save(&source)
        .unwrap();
    let output_dir = temp.path().join("output");

    let mut app = App::with_services(
        AppServices {
            photo: PhotoGenerator::new(
                Box::new(MockImageVariationClient::new()),
                &source,
                &output_dir,
            ),
            ebook: EbookGenerator::new(Box::new(
                MockChatClient::new().with_response("The Dodgers won.".to_string()),
            )),
            session: transcript_session(MockBackend::new().echoing_context_with("Nice!"))
                .with_turn_limit(2),
            input: Box::new(ScriptedInput::new(["hi", "bye"])),
            output: Box::new(RecordingSink::new()),
        },
        output_dir.clone(),
        RunSettings {
            image_variations: 2,
            image_size: "512x512".to_string(),
            ebook_topic: Some("baseball".to_string()),
            chat_turns: 2,
        },
    )
    .with_retry_delay(Duration::from_millis(1));

    let summary = app.run().await.unwrap();

    assert_eq!(summary.variations.len(), 2);
    assert!(summary.ebook_path.starts_with(&output_dir));
    assert_eq!(
        std::fs::read_to_string(&summary.ebook_path).unwrap(),
        "The Dodgers won."
    );
    assert!(summary.chat.is_complete());
    assert_eq!(app.session().phase(), SessionPhase::Done);
}
