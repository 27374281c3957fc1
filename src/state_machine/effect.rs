//! Effects produced by state transitions

use crate::client::{ClientError, GenerationRequest};
use crate::story::{ConversationTurn, FormattedStory};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a turn to the conversation
    AppendTurn { turn: ConversationTurn },

    /// Ask the generation service for the next turn
    RequestGeneration { request: GenerationRequest },

    /// Send the finished story to the formatting service
    FormatStory { story_text: String },

    /// Tell whoever is presenting the session
    Notify(Notice),
}

/// Session updates that are not turns
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    GenerationFailed { error: ClientError },
    StoryEnded,
    StoryFormatted { story: FormattedStory },
    FormatFailed { error: ClientError },
}

impl Effect {
    #[must_use]
    pub fn append_user_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: ConversationTurn::user(text),
        }
    }

    #[must_use]
    pub fn append_ai_turn(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: ConversationTurn::ai(text),
        }
    }

    #[must_use]
    pub fn request_generation(new_input: impl Into<String>, context: impl Into<String>) -> Self {
        Effect::RequestGeneration {
            request: GenerationRequest {
                new_input: new_input.into(),
                context: context.into(),
            },
        }
    }
}
