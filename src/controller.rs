//! Conversation controller
//!
//! Owns one session's conversation and state. Every operation goes through
//! the pure [`transition`] function; the controller commits the new state,
//! applies appended turns, and hands the remaining effects (remote requests
//! and notices) back to the caller to execute.

use crate::client::{ClientError, GenerationRequest};
use crate::state_machine::{transition, ConvState, Effect, Event, TransitionError};
use crate::story::{Conversation, ConversationTurn, FormattedStory};

/// What happened to a submitted user turn
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Appended; the caller must execute these effects
    Accepted(Vec<Effect>),
    /// Blank text or the story is over. Nothing changed.
    Ignored(TransitionError),
    /// A continuation is still outstanding. Nothing changed.
    Busy,
}

impl Submission {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted(_))
    }

    /// The continuation request the caller must send, if any
    #[must_use]
    pub fn generation_request(&self) -> Option<&GenerationRequest> {
        match self {
            Submission::Accepted(effects) => generation_request(effects),
            _ => None,
        }
    }

    /// The finished story the caller must format, if this turn ended it
    #[must_use]
    pub fn story_to_format(&self) -> Option<&str> {
        match self {
            Submission::Accepted(effects) => story_to_format(effects),
            _ => None,
        }
    }
}

/// Find the generation request among effects
#[must_use]
pub fn generation_request(effects: &[Effect]) -> Option<&GenerationRequest> {
    effects.iter().find_map(|effect| match effect {
        Effect::RequestGeneration { request } => Some(request),
        _ => None,
    })
}

/// Find the story to format among effects
#[must_use]
pub fn story_to_format(effects: &[Effect]) -> Option<&str> {
    effects.iter().find_map(|effect| match effect {
        Effect::FormatStory { story_text } => Some(story_text.as_str()),
        _ => None,
    })
}

/// State machine driver for a single story session
#[derive(Debug, Default)]
pub struct ConversationController {
    state: ConvState,
    conversation: Conversation,
}

impl ConversationController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one event through the state machine.
    ///
    /// `AppendTurn` effects are applied here; every other effect is returned
    /// in order.
    ///
    /// # Errors
    ///
    /// Returns the [`TransitionError`] when the event is not valid in the
    /// current state. Nothing is changed in that case.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let result = transition(&self.state, &self.conversation, event)?;

        if result.new_state != self.state {
            tracing::debug!(
                from = self.state.name(),
                to = result.new_state.name(),
                "Story state change"
            );
        }
        self.state = result.new_state;

        let mut pending = Vec::with_capacity(result.effects.len());
        for effect in result.effects {
            match effect {
                Effect::AppendTurn { turn } => self.conversation.push(turn),
                other => pending.push(other),
            }
        }
        Ok(pending)
    }

    /// Offer the user's next turn.
    ///
    /// Blank text and turns after the end are dropped silently; a turn while a
    /// continuation is outstanding is refused as [`Submission::Busy`].
    pub fn submit_user_turn(&mut self, text: impl Into<String>) -> Submission {
        match self.handle(Event::UserTurn { text: text.into() }) {
            Ok(effects) => Submission::Accepted(effects),
            Err(TransitionError::GenerationInFlight) => {
                tracing::debug!("Refusing user turn while a continuation is outstanding");
                Submission::Busy
            }
            Err(e) => {
                tracing::debug!(reason = %e, "Ignoring user turn");
                Submission::Ignored(e)
            }
        }
    }

    /// Complete the outstanding generation request with the service's text.
    ///
    /// # Errors
    ///
    /// Fails with [`TransitionError::InvalidTransition`] if no continuation
    /// was outstanding.
    pub fn apply_ai_turn(
        &mut self,
        response_text: impl Into<String>,
    ) -> Result<Vec<Effect>, TransitionError> {
        self.handle(Event::GenerationComplete {
            text: response_text.into(),
        })
    }

    /// Complete the outstanding generation request with a failure.
    ///
    /// The user's turn stays; input re-opens so the user may try again.
    ///
    /// # Errors
    ///
    /// Fails with [`TransitionError::InvalidTransition`] if no continuation
    /// was outstanding.
    pub fn record_generation_failure(
        &mut self,
        error: ClientError,
    ) -> Result<Vec<Effect>, TransitionError> {
        tracing::warn!(error = %error, kind = error.kind.as_str(), "Story continuation failed");
        self.handle(Event::GenerationFailed { error })
    }

    /// Complete the format request with the formatted story.
    ///
    /// # Errors
    ///
    /// Fails with [`TransitionError::InvalidTransition`] unless formatting
    /// was outstanding.
    pub fn record_formatted(
        &mut self,
        story: FormattedStory,
    ) -> Result<Vec<Effect>, TransitionError> {
        self.handle(Event::FormatComplete { story })
    }

    /// Complete the format request with a failure.
    ///
    /// # Errors
    ///
    /// Fails with [`TransitionError::InvalidTransition`] unless formatting
    /// was outstanding.
    pub fn record_format_failure(
        &mut self,
        error: ClientError,
    ) -> Result<Vec<Effect>, TransitionError> {
        tracing::error!(error = %error, kind = error.kind.as_str(), "Story formatting failed");
        self.handle(Event::FormatFailed { error })
    }

    /// The story so far
    #[must_use]
    pub fn current_story(&self) -> &str {
        self.conversation.story()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.is_ended()
    }

    #[must_use]
    pub fn state(&self) -> &ConvState {
        &self.state
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        self.conversation.turns()
    }
}
