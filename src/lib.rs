//! Storyloom - collaborative storytelling client
//!
//! A user and a story-generation service take turns extending a story until
//! either side writes `THE END`. The finished story is then sent once to a
//! formatting service that returns a titled, formatted version.

pub mod client;
pub mod config;
pub mod controller;
pub mod runtime;
pub mod state_machine;
pub mod story;

pub use controller::{ConversationController, Submission};
pub use runtime::{SessionEvent, SessionHandle, SessionRuntime, SessionSnapshot};
pub use story::{is_terminal, TERMINAL_MARKER};
