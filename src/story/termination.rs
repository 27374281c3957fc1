//! Terminal marker detection

/// Literal marker whose trailing presence ends a session
pub const TERMINAL_MARKER: &str = "THE END";

/// Check whether a turn's text ends the story.
///
/// Surrounding whitespace is ignored; everything else is an exact,
/// case-sensitive suffix match. `"THE END."` does not count.
#[must_use]
pub fn is_terminal(text: &str) -> bool {
    text.trim().ends_with(TERMINAL_MARKER)
}
