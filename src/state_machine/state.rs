//! Story session state types

use crate::client::ClientErrorKind;
use crate::story::FormattedStory;

/// Story session state
///
/// `Idle` and `AwaitingGeneration` are the active states; everything from
/// `Formatting` on is ended and never leads back to an active state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConvState {
    /// Ready for the next user turn
    #[default]
    Idle,

    /// User turn appended, continuation request in flight
    AwaitingGeneration,

    /// Story ended, format request in flight
    Formatting,

    /// Story ended and formatted
    Finished { story: FormattedStory },

    /// Story ended but the formatting service failed
    FormatFailed {
        message: String,
        kind: ClientErrorKind,
    },
}

impl ConvState {
    /// Whether a terminal turn has been accepted
    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(
            self,
            ConvState::Formatting | ConvState::Finished { .. } | ConvState::FormatFailed { .. }
        )
    }

    /// Whether a remote request is outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, ConvState::AwaitingGeneration | ConvState::Formatting)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::AwaitingGeneration => "awaiting_generation",
            ConvState::Formatting => "formatting",
            ConvState::Finished { .. } => "finished",
            ConvState::FormatFailed { .. } => "format_failed",
        }
    }
}
