//! Story context assembly

use super::ConversationTurn;

/// Join every turn's text with a single space, in sequence order.
#[must_use]
pub fn assemble(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| turn.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
