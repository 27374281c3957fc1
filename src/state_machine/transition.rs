//! Pure state transition function

use super::{ConvState, Effect, Event, Notice};
use crate::client::ClientError;
use crate::story::{is_terminal, Conversation};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    #[must_use]
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Turn text is empty")]
    EmptyInput,
    #[error("The story has already ended")]
    SessionEnded,
    #[error("Still waiting for the story to continue, try again in a moment")]
    GenerationInFlight,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Input the session drops without telling anyone
    #[must_use]
    pub fn is_ignorable(&self) -> bool {
        matches!(self, TransitionError::EmptyInput | TransitionError::SessionEnded)
    }
}

/// Pure transition function
///
/// Given the same state, conversation and event it always produces the same
/// result. The conversation is only read; appends come back as
/// [`Effect::AppendTurn`].
///
/// # Errors
///
/// Returns a [`TransitionError`] when the event is not valid in `state`. The
/// state must be left unchanged in that case.
pub fn transition(
    state: &ConvState,
    conversation: &Conversation,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User turns
        // ============================================================

        (_, Event::UserTurn { text }) if text.trim().is_empty() => Err(TransitionError::EmptyInput),

        (state, Event::UserTurn { .. }) if state.is_ended() => Err(TransitionError::SessionEnded),

        (ConvState::AwaitingGeneration, Event::UserTurn { .. }) => {
            Err(TransitionError::GenerationInFlight)
        }

        // Idle + terminal UserTurn -> Formatting, no generation call
        (ConvState::Idle, Event::UserTurn { text }) if is_terminal(&text) => {
            let story_text = conversation.story_with(&text);
            Ok(end_story(story_text).prepend(Effect::append_user_turn(text)))
        }

        // Idle + UserTurn -> AwaitingGeneration
        (ConvState::Idle, Event::UserTurn { text }) => {
            let context = conversation.story_with(&text);
            Ok(TransitionResult::new(ConvState::AwaitingGeneration)
                .with_effect(Effect::append_user_turn(text.clone()))
                .with_effect(Effect::request_generation(text, context)))
        }

        // ============================================================
        // Generation results
        // ============================================================

        // A blank continuation would break the story; treat it like a failure
        (ConvState::AwaitingGeneration, Event::GenerationComplete { text })
            if text.trim().is_empty() =>
        {
            Ok(generation_failed(ClientError::malformed_response(
                "Generation service returned an empty continuation",
            )))
        }

        (ConvState::AwaitingGeneration, Event::GenerationComplete { text })
            if is_terminal(&text) =>
        {
            let story_text = conversation.story_with(&text);
            Ok(end_story(story_text).prepend(Effect::append_ai_turn(text)))
        }

        (ConvState::AwaitingGeneration, Event::GenerationComplete { text }) => {
            Ok(TransitionResult::new(ConvState::Idle).with_effect(Effect::append_ai_turn(text)))
        }

        // Failure leaves the user turn in place and re-opens input; no retry
        (ConvState::AwaitingGeneration, Event::GenerationFailed { error }) => {
            Ok(generation_failed(error))
        }

        // ============================================================
        // Formatting results
        // ============================================================

        (ConvState::Formatting, Event::FormatComplete { story }) => {
            Ok(TransitionResult::new(ConvState::Finished {
                story: story.clone(),
            })
            .with_effect(Effect::Notify(Notice::StoryFormatted { story })))
        }

        (ConvState::Formatting, Event::FormatFailed { error }) => {
            Ok(TransitionResult::new(ConvState::FormatFailed {
                message: error.message.clone(),
                kind: error.kind,
            })
            .with_effect(Effect::Notify(Notice::FormatFailed { error })))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

// Helper functions

impl TransitionResult {
    fn prepend(mut self, effect: Effect) -> Self {
        self.effects.insert(0, effect);
        self
    }
}

fn end_story(story_text: String) -> TransitionResult {
    TransitionResult::new(ConvState::Formatting)
        .with_effect(Effect::Notify(Notice::StoryEnded))
        .with_effect(Effect::FormatStory { story_text })
}

fn generation_failed(error: ClientError) -> TransitionResult {
    TransitionResult::new(ConvState::Idle)
        .with_effect(Effect::Notify(Notice::GenerationFailed { error }))
}
