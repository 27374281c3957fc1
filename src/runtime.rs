//! Runtime for story sessions
//!
//! One background task per session owns the [`ConversationController`] and
//! executes its effects. UI code talks to it through a [`SessionHandle`].
//!
//! [`ConversationController`]: crate::controller::ConversationController

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::client::ClientError;
use crate::state_machine::{ConvState, Event};
use crate::story::{ConversationTurn, FormattedStory};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Updates broadcast to session subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TurnAppended { turn: ConversationTurn },
    /// The service could not continue the story; the user may try again
    GenerationFailed { error: ClientError },
    /// A submission was refused (a continuation is still outstanding)
    Rejected { reason: String },
    StoryEnded { story: String },
    StoryFormatted { story: FormattedStory },
    FormatFailed { error: ClientError },
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub story: String,
    pub turns: Vec<ConversationTurn>,
    pub state: ConvState,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.is_ended()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Story session has stopped")]
    SessionClosed,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    finish: CancellationToken,
    cancel: CancellationToken,
}

impl SessionHandle {
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send the user's next turn.
    ///
    /// Acceptance is reported asynchronously through [`SessionEvent`]s.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::SessionClosed`] once the session has stopped.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.event_tx
            .send(Event::user_turn(text))
            .await
            .map_err(|_| RuntimeError::SessionClosed)
    }

    /// Subscribe to session updates
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Watch the session snapshot
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    #[must_use]
    pub fn current_story(&self) -> String {
        self.snapshot_rx.borrow().story.clone()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.snapshot_rx.borrow().is_done()
    }

    /// Stop accepting new work and let the session wind down.
    ///
    /// Turns already submitted are still applied, and any continuation or
    /// formatting they start runs to completion before the session stops.
    pub fn finish(&self) {
        self.finish.cancel();
    }

    /// Stop the session and abandon any outstanding request
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the session has stopped, whether finished or closed
    pub async fn stopped(&self) {
        self.cancel.cancelled().await;
    }
}
