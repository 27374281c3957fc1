//! Wire types for the story service

use serde::{Deserialize, Serialize};

/// Request to continue the story by one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The turn the user just contributed
    pub new_input: String,
    /// The whole story so far, including `new_input`
    pub context: String,
}

/// Successful `/generate` body
#[derive(Debug, Deserialize)]
pub(crate) struct GenerationResponse {
    pub response: String,
}

/// `/format-story` request body
#[derive(Debug, Serialize)]
pub(crate) struct FormatRequest<'a> {
    pub story_text: &'a str,
}

/// Successful `/format-story` body
#[derive(Debug, Deserialize)]
pub(crate) struct FormatResponse {
    #[serde(default)]
    pub title: String,
    pub formatted_story: String,
}

/// Error body the service sends alongside non-success statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}
