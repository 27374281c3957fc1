//! Story data model
//!
//! Turns, the append-only conversation, and the two pure functions the
//! controller derives everything else from: context assembly and the
//! terminal-marker check.

mod assembler;
mod termination;
mod turn;

pub use assembler::assemble;
pub use termination::{is_terminal, TERMINAL_MARKER};
pub use turn::{Conversation, ConversationTurn, FormattedStory, Sender};
