//! Events that can occur in a story session

use crate::client::ClientError;
use crate::story::FormattedStory;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserTurn {
        text: String,
    },

    // Generation service events
    GenerationComplete {
        text: String,
    },
    GenerationFailed {
        error: ClientError,
    },

    // Formatting service events
    FormatComplete {
        story: FormattedStory,
    },
    FormatFailed {
        error: ClientError,
    },
}

impl Event {
    #[must_use]
    pub fn user_turn(text: impl Into<String>) -> Self {
        Event::UserTurn { text: text.into() }
    }
}
