//! Mock implementations for testing
//!
//! These mocks enable session testing without a story service.

use crate::client::{ClientError, FormatterClient, GenerationClient, GenerationRequest};
use crate::story::FormattedStory;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

// ============================================================================
// Mock Generation Client
// ============================================================================

/// Mock generation client that returns queued responses
pub struct MockGenerationClient {
    responses: Mutex<VecDeque<Result<String, ClientError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful continuation
    pub fn queue_response(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::network("No mock response queued")))
    }
}

// ============================================================================
// Gated Generation Client (for in-flight testing)
// ============================================================================

/// Generation client that holds every request until released
pub struct GatedGenerationClient {
    inner: MockGenerationClient,
    release: Notify,
}

impl GatedGenerationClient {
    pub fn new() -> Self {
        Self {
            inner: MockGenerationClient::new(),
            release: Notify::new(),
        }
    }

    pub fn queue_response(&self, text: impl Into<String>) {
        self.inner.queue_response(text);
    }

    /// Let one held request complete
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl GenerationClient for GatedGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        self.release.notified().await;
        self.inner.generate(request).await
    }
}

/// Generation client that never answers
pub struct StalledGenerationClient;

#[async_trait]
impl GenerationClient for StalledGenerationClient {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, ClientError> {
        std::future::pending().await
    }
}

// ============================================================================
// Mock Formatter Client
// ============================================================================

/// Mock formatter that returns queued results
pub struct MockFormatterClient {
    results: Mutex<VecDeque<Result<FormattedStory, ClientError>>>,
    /// Record of every story sent for formatting
    pub stories: Mutex<Vec<String>>,
}

impl MockFormatterClient {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            stories: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_story(&self, title: &str, formatted_story: &str) {
        self.results.lock().unwrap().push_back(Ok(FormattedStory {
            title: title.to_string(),
            formatted_story: formatted_story.to_string(),
        }));
    }

    pub fn queue_error(&self, error: ClientError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_stories(&self) -> Vec<String> {
        self.stories.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormatterClient for MockFormatterClient {
    async fn format(&self, full_story: &str) -> Result<FormattedStory, ClientError> {
        self.stories.lock().unwrap().push(full_story.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::network("No mock story queued")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientErrorKind;
    use crate::config::SessionTimeouts;
    use crate::runtime::{RuntimeError, SessionEvent, SessionHandle, SessionRuntime};
    use crate::state_machine::ConvState;
    use crate::story::{ConversationTurn, Sender};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn timeouts() -> SessionTimeouts {
        SessionTimeouts {
            generate: Duration::from_secs(5),
            format: Duration::from_secs(5),
        }
    }

    async fn wait_stopped(handle: &SessionHandle) {
        tokio::time::timeout(Duration::from_secs(5), handle.stopped())
            .await
            .expect("Session did not stop");
    }

    async fn next_event(rx: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("Timed out waiting for session event")
            .expect("Session event channel closed")
    }

    #[tokio::test]
    async fn test_user_turn_then_ai_turn() {
        let generator = Arc::new(MockGenerationClient::new());
        generator.queue_response("a dragon appeared.");
        let formatter = Arc::new(MockFormatterClient::new());
        let handle = SessionRuntime::spawn(generator.clone(), formatter.clone(), timeouts());
        let mut events = handle.subscribe();

        handle.submit("Once upon a time").await.unwrap();

        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::TurnAppended {
                turn: ConversationTurn::user("Once upon a time")
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::TurnAppended {
                turn: ConversationTurn::ai("a dragon appeared.")
            }
        );

        let requests = generator.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].new_input, "Once upon a time");
        assert_eq!(requests[0].context, "Once upon a time");

        assert_eq!(handle.current_story(), "Once upon a time a dragon appeared.");
        assert!(!handle.is_done());
        assert_eq!(handle.snapshot().state, ConvState::Idle);
        assert!(formatter.recorded_stories().is_empty());
    }

    #[tokio::test]
    async fn test_user_ends_story_without_generation() {
        let generator = Arc::new(MockGenerationClient::new());
        let formatter = Arc::new(MockFormatterClient::new());
        formatter.queue_story("Happily Ever After", "And they lived happily.\n\nTHE END");
        let handle = SessionRuntime::spawn(generator.clone(), formatter.clone(), timeouts());
        let mut events = handle.subscribe();

        handle.submit("And they lived happily. THE END").await.unwrap();

        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::TurnAppended { turn } if turn.sender == Sender::User
        ));
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::StoryEnded {
                story: "And they lived happily. THE END".to_string()
            }
        );
        assert!(handle.is_done());

        let SessionEvent::StoryFormatted { story } = next_event(&mut events).await else {
            panic!("Expected formatted story");
        };
        assert_eq!(story.title, "Happily Ever After");

        assert!(generator.recorded_requests().is_empty());
        assert_eq!(
            formatter.recorded_stories(),
            vec!["And they lived happily. THE END".to_string()]
        );
        assert!(matches!(handle.snapshot().state, ConvState::Finished { .. }));
    }

    #[tokio::test]
    async fn test_ai_ends_story() {
        let generator = Arc::new(MockGenerationClient::new());
        generator.queue_response("The castle fell silent forever. THE END");
        let formatter = Arc::new(MockFormatterClient::new());
        formatter.queue_story("Silence", "Body");
        let handle = SessionRuntime::spawn(generator.clone(), formatter.clone(), timeouts());
        let mut events = handle.subscribe();

        handle.submit("The king closed the gates.").await.unwrap();

        next_event(&mut events).await; // user turn
        next_event(&mut events).await; // ai turn
        assert!(matches!(next_event(&mut events).await, SessionEvent::StoryEnded { .. }));
        assert!(matches!(next_event(&mut events).await, SessionEvent::StoryFormatted { .. }));

        assert!(handle.is_done());
        assert_eq!(
            formatter.recorded_stories(),
            vec![
                "The king closed the gates. The castle fell silent forever. THE END".to_string()
            ]
        );

        // Nothing more is accepted, even once the runtime has seen the turn
        let story = handle.current_story();
        handle.submit("A sequel begins.").await.unwrap();
        handle.finish();
        wait_stopped(&handle).await;

        assert!(events.try_recv().is_err(), "Turn appended after the end");
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.turns.len(), 2);
        assert_eq!(snapshot.story, story);
        assert_eq!(generator.recorded_requests().len(), 1);
        assert_eq!(formatter.recorded_stories().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_then_retry() {
        let generator = Arc::new(MockGenerationClient::new());
        generator.queue_error(ClientError::server_error("Server error: boom"));
        generator.queue_response("and the sun rose.");
        let handle = SessionRuntime::spawn(
            generator.clone(),
            Arc::new(MockFormatterClient::new()),
            timeouts(),
        );
        let mut events = handle.subscribe();

        handle.submit("Night fell").await.unwrap();

        next_event(&mut events).await; // user turn
        let SessionEvent::GenerationFailed { error } = next_event(&mut events).await else {
            panic!("Expected generation failure");
        };
        assert_eq!(error.kind, ClientErrorKind::ServerError);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state, ConvState::Idle);
        assert_eq!(snapshot.turns.len(), 1);

        handle.submit("Night fell").await.unwrap();

        next_event(&mut events).await; // user turn again
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::TurnAppended {
                turn: ConversationTurn::ai("and the sun rose.")
            }
        );
        assert_eq!(handle.current_story(), "Night fell Night fell and the sun rose.");
    }

    #[tokio::test]
    async fn test_second_turn_rejected_while_generating() {
        let generator = Arc::new(GatedGenerationClient::new());
        generator.queue_response("It ran.");
        let handle = SessionRuntime::spawn(
            generator.clone(),
            Arc::new(MockFormatterClient::new()),
            timeouts(),
        );
        let mut events = handle.subscribe();

        handle.submit("A fox appeared.").await.unwrap();
        next_event(&mut events).await; // user turn

        handle.submit("Then a wolf.").await.unwrap();
        assert!(matches!(next_event(&mut events).await, SessionEvent::Rejected { .. }));
        assert_eq!(handle.snapshot().turns.len(), 1);

        generator.release_one();
        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::TurnAppended {
                turn: ConversationTurn::ai("It ran.")
            }
        );
        assert_eq!(generator.recorded_requests().len(), 1);
        assert_eq!(handle.current_story(), "A fox appeared. It ran.");
    }

    #[tokio::test]
    async fn test_blank_turn_is_silently_ignored() {
        let generator = Arc::new(MockGenerationClient::new());
        generator.queue_response("Yes.");
        let handle = SessionRuntime::spawn(
            generator.clone(),
            Arc::new(MockFormatterClient::new()),
            timeouts(),
        );
        let mut events = handle.subscribe();

        handle.submit("   ").await.unwrap();
        handle.submit("Hello?").await.unwrap();

        assert_eq!(
            next_event(&mut events).await,
            SessionEvent::TurnAppended {
                turn: ConversationTurn::user("Hello?")
            }
        );
        assert_eq!(generator.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_timeout_is_a_failure() {
        let handle = SessionRuntime::spawn(
            StalledGenerationClient,
            MockFormatterClient::new(),
            SessionTimeouts {
                generate: Duration::from_millis(50),
                format: Duration::from_secs(5),
            },
        );
        let mut events = handle.subscribe();

        handle.submit("Waiting...").await.unwrap();

        next_event(&mut events).await; // user turn
        let SessionEvent::GenerationFailed { error } = next_event(&mut events).await else {
            panic!("Expected generation failure");
        };
        assert_eq!(error.kind, ClientErrorKind::Timeout);
        assert_eq!(handle.snapshot().state, ConvState::Idle);
    }

    #[tokio::test]
    async fn test_format_failure_is_surfaced() {
        let formatter = Arc::new(MockFormatterClient::new());
        formatter.queue_error(ClientError::server_error("Server error: formatter down"));
        let handle =
            SessionRuntime::spawn(MockGenerationClient::new(), formatter.clone(), timeouts());
        let mut events = handle.subscribe();

        handle.submit("Done already. THE END").await.unwrap();

        next_event(&mut events).await; // user turn
        next_event(&mut events).await; // story ended
        let SessionEvent::FormatFailed { error } = next_event(&mut events).await else {
            panic!("Expected format failure");
        };
        assert!(error.message.contains("formatter down"));

        let snapshot = handle.snapshot();
        assert!(snapshot.is_done());
        assert!(matches!(snapshot.state, ConvState::FormatFailed { .. }));
        assert_eq!(formatter.recorded_stories().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_session_refuses_turns() {
        let handle = SessionRuntime::spawn(
            MockGenerationClient::new(),
            MockFormatterClient::new(),
            timeouts(),
        );

        handle.close();

        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if handle.submit("Anyone there?").await == Err(RuntimeError::SessionClosed) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(closed.is_ok(), "Session kept accepting turns after close");
    }

    #[tokio::test]
    async fn test_finish_still_formats_a_queued_ending() {
        let generator = Arc::new(MockGenerationClient::new());
        let formatter = Arc::new(MockFormatterClient::new());
        formatter.queue_story("Happily", "They lived happily. THE END");
        let handle = SessionRuntime::spawn(generator.clone(), formatter.clone(), timeouts());
        let mut events = handle.subscribe();

        // End of input right behind the last turn
        handle.submit("They lived happily. THE END").await.unwrap();
        handle.finish();
        wait_stopped(&handle).await;

        assert_eq!(
            formatter.recorded_stories(),
            vec!["They lived happily. THE END".to_string()]
        );
        assert!(generator.recorded_requests().is_empty());
        assert!(matches!(handle.snapshot().state, ConvState::Finished { .. }));

        next_event(&mut events).await; // user turn
        next_event(&mut events).await; // story ended
        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::StoryFormatted { .. }
        ));
    }

    #[tokio::test]
    async fn test_finish_waits_for_outstanding_continuation() {
        let generator = Arc::new(GatedGenerationClient::new());
        generator.queue_response("The tide came in.");
        let handle =
            SessionRuntime::spawn(generator.clone(), MockFormatterClient::new(), timeouts());
        let mut events = handle.subscribe();

        handle.submit("The boat waited.").await.unwrap();
        next_event(&mut events).await; // user turn
        handle.finish();

        generator.release_one();
        wait_stopped(&handle).await;

        assert_eq!(handle.current_story(), "The boat waited. The tide came in.");
        assert_eq!(handle.snapshot().state, ConvState::Idle);
    }

    #[tokio::test]
    async fn test_finish_idle_session_stops() {
        let handle = SessionRuntime::spawn(
            MockGenerationClient::new(),
            MockFormatterClient::new(),
            timeouts(),
        );

        let other = handle.clone();
        assert!(!handle.session_id().is_empty());
        assert_eq!(other.session_id(), handle.session_id());

        handle.finish();
        wait_stopped(&other).await;

        assert_eq!(
            handle.submit("Too late").await,
            Err(RuntimeError::SessionClosed)
        );
        assert!(handle.snapshot().turns.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_watch_sees_growth() {
        let generator = Arc::new(MockGenerationClient::new());
        generator.queue_response("Two.");
        let handle = SessionRuntime::spawn(generator, MockFormatterClient::new(), timeouts());
        let mut watch = handle.watch();

        handle.submit("One.").await.unwrap();

        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            watch.wait_for(|s| s.turns.len() == 2),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(snapshot.story, "One. Two.");
    }
}
