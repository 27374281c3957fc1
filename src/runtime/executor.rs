//! Story session executor

use super::{SessionEvent, SessionHandle, SessionSnapshot};
use crate::client::{
    ClientError, FormatterClient, GenerationClient, GenerationRequest, LoggingClient,
};
use crate::config::SessionTimeouts;
use crate::controller::{ConversationController, Submission};
use crate::state_machine::{Effect, Event, Notice, TransitionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Session runtime that can work with any generation and formatting clients
pub struct SessionRuntime<G, F>
where
    G: GenerationClient + 'static,
    F: FormatterClient + 'static,
{
    session_id: String,
    controller: ConversationController,
    generator: Arc<LoggingClient<G>>,
    formatter: Arc<LoggingClient<F>>,
    timeouts: SessionTimeouts,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the session stops once every handle is gone
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Asks the session to drain queued work and stop
    finish: CancellationToken,
    /// Cancels the session and any request still in flight
    cancel: CancellationToken,
}

impl<G, F> SessionRuntime<G, F>
where
    G: GenerationClient + 'static,
    F: FormatterClient + 'static,
{
    /// Start a new session in the background and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(generator: G, formatter: F, timeouts: SessionTimeouts) -> SessionHandle {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let finish = CancellationToken::new();
        let cancel = CancellationToken::new();

        let runtime = Self {
            session_id: session_id.clone(),
            controller: ConversationController::new(),
            generator: Arc::new(LoggingClient::new(generator, session_id.clone())),
            formatter: Arc::new(LoggingClient::new(formatter, session_id.clone())),
            timeouts,
            event_rx,
            event_tx: event_tx.downgrade(),
            broadcast_tx: broadcast_tx.clone(),
            snapshot_tx,
            finish: finish.clone(),
            cancel: cancel.clone(),
        };

        tokio::spawn(runtime.run());

        SessionHandle {
            session_id,
            event_tx,
            broadcast_tx,
            snapshot_rx,
            finish,
            cancel,
        }
    }

    async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting story session");

        let mut draining = false;

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = self.finish.cancelled(), if !draining => {
                    tracing::debug!(session_id = %self.session_id, "Finishing story session");
                    draining = true;
                }
                event = self.event_rx.recv() => match event {
                    Some(event) => self.process_event(event),
                    None => break,
                },
            }

            if draining && self.is_drained() {
                break;
            }
        }

        // Abandon anything still in flight
        self.cancel.cancel();

        tracing::info!(
            session_id = %self.session_id,
            turns = self.controller.turns().len(),
            state = self.controller.state().name(),
            "Story session stopped"
        );
    }

    /// Nothing queued and no remote request outstanding
    fn is_drained(&self) -> bool {
        self.event_rx.is_empty() && !self.controller.state().is_busy()
    }

    fn process_event(&mut self, event: Event) {
        let turns_before = self.controller.turns().len();

        let outcome = match event {
            Event::UserTurn { text } => match self.controller.submit_user_turn(text) {
                Submission::Accepted(effects) => Ok(effects),
                Submission::Busy => Err(TransitionError::GenerationInFlight),
                Submission::Ignored(e) => Err(e),
            },
            Event::GenerationComplete { text } => self.controller.apply_ai_turn(text),
            Event::GenerationFailed { error } => self.controller.record_generation_failure(error),
            Event::FormatComplete { story } => self.controller.record_formatted(story),
            Event::FormatFailed { error } => self.controller.record_format_failure(error),
        };

        // Subscribers reacting to the events below must see the new snapshot
        self.publish_snapshot();

        for turn in &self.controller.turns()[turns_before..] {
            let _ = self.broadcast_tx.send(SessionEvent::TurnAppended { turn: turn.clone() });
        }

        match outcome {
            Ok(effects) => {
                for effect in effects {
                    self.execute_effect(effect);
                }
            }
            Err(e) if e.is_ignorable() => {}
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "Event rejected");
                let _ = self.broadcast_tx.send(SessionEvent::Rejected {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            // Applied by the controller before effects reach the runtime
            Effect::AppendTurn { .. } => {}

            Effect::RequestGeneration { request } => self.spawn_generation(request),

            Effect::FormatStory { story_text } => self.spawn_format(story_text),

            Effect::Notify(notice) => {
                let event = match notice {
                    Notice::GenerationFailed { error } => SessionEvent::GenerationFailed { error },
                    Notice::StoryEnded => SessionEvent::StoryEnded {
                        story: self.controller.current_story().to_string(),
                    },
                    Notice::StoryFormatted { story } => SessionEvent::StoryFormatted { story },
                    Notice::FormatFailed { error } => SessionEvent::FormatFailed { error },
                };
                let _ = self.broadcast_tx.send(event);
            }
        }
    }

    /// Request the next turn as a background task; the result comes back as
    /// an event
    fn spawn_generation(&self, request: GenerationRequest) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            return;
        };
        let generator = self.generator.clone();
        let cancel = self.cancel.clone();
        let deadline = self.timeouts.generate;
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            tracing::debug!(session_id = %session_id, "Requesting story continuation");

            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = timeout(deadline, generator.generate(&request)) => result,
            };

            let event = match result {
                Ok(Ok(text)) => Event::GenerationComplete { text },
                Ok(Err(error)) => Event::GenerationFailed { error },
                Err(_) => Event::GenerationFailed {
                    error: timed_out("continuation", deadline),
                },
            };
            let _ = event_tx.send(event).await;
        });
    }

    fn spawn_format(&self, story_text: String) {
        let Some(event_tx) = self.event_tx.upgrade() else {
            return;
        };
        let formatter = self.formatter.clone();
        let cancel = self.cancel.clone();
        let deadline = self.timeouts.format;

        tokio::spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = timeout(deadline, formatter.format(&story_text)) => result,
            };

            let event = match result {
                Ok(Ok(story)) => Event::FormatComplete { story },
                Ok(Err(error)) => Event::FormatFailed { error },
                Err(_) => Event::FormatFailed {
                    error: timed_out("formatted story", deadline),
                },
            };
            let _ = event_tx.send(event).await;
        });
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            story: self.controller.current_story().to_string(),
            turns: self.controller.turns().to_vec(),
            state: self.controller.state().clone(),
        });
    }
}

fn timed_out(what: &str, deadline: Duration) -> ClientError {
    ClientError::timeout(format!(
        "No {what} from the story service within {deadline:?}"
    ))
}
