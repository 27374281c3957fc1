//! Turn and conversation types

use serde::{Deserialize, Serialize};

/// Who contributed a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "you",
            Sender::Ai => "ai",
        }
    }
}

/// One contribution to the story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.into(),
        }
    }
}

/// Append-only sequence of turns with the running story context.
///
/// The context is extended on every push and never rebuilt, so it always
/// equals [`super::assemble`] over the turns.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    story: String,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if !self.turns.is_empty() {
            self.story.push(' ');
        }
        self.story.push_str(&turn.text);
        self.turns.push(turn);
    }

    /// The story as it would read after appending `text`, without appending it
    #[must_use]
    pub fn story_with(&self, text: &str) -> String {
        if self.turns.is_empty() {
            text.to_string()
        } else {
            format!("{} {text}", self.story)
        }
    }

    #[must_use]
    pub fn story(&self) -> &str {
        &self.story
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Finished story as returned by the formatting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedStory {
    pub title: String,
    pub formatted_story: String,
}

impl FormattedStory {
    /// Title and body as a single block of text, ready to print or copy
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            self.formatted_story.clone()
        } else {
            format!("{title}\n\n{}", self.formatted_story)
        }
    }
}
