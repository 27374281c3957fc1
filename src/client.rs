//! Story service clients
//!
//! The two remote boundaries the controller depends on: continuing the story
//! by one turn, and formatting the finished story.

mod error;
mod http;
mod types;

pub use error::{ClientError, ClientErrorKind};
pub use http::StoryApiClient;
pub use types::GenerationRequest;

use crate::story::FormattedStory;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Produces the next turn of a story
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Ask the service to continue the story
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError>;
}

/// Turns a finished story into a titled, formatted one
#[async_trait]
pub trait FormatterClient: Send + Sync {
    async fn format(&self, full_story: &str) -> Result<FormattedStory, ClientError>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<T: FormatterClient + ?Sized> FormatterClient for Arc<T> {
    async fn format(&self, full_story: &str) -> Result<FormattedStory, ClientError> {
        (**self).format(full_story).await
    }
}

/// Logging wrapper for story service clients
pub struct LoggingClient<C> {
    inner: C,
    session_id: String,
}

impl<C> LoggingClient<C> {
    #[must_use]
    pub fn new(inner: C, session_id: impl Into<String>) -> Self {
        Self {
            inner,
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
impl<C: GenerationClient> GenerationClient for LoggingClient<C> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let start = Instant::now();
        let result = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    session_id = %self.session_id,
                    duration_ms = %duration.as_millis(),
                    context_chars = request.context.len(),
                    response_chars = text.len(),
                    "Generation request completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Generation request failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl<C: FormatterClient> FormatterClient for LoggingClient<C> {
    async fn format(&self, full_story: &str) -> Result<FormattedStory, ClientError> {
        let start = Instant::now();
        let result = self.inner.format(full_story).await;
        let duration = start.elapsed();

        match &result {
            Ok(story) => {
                tracing::info!(
                    session_id = %self.session_id,
                    duration_ms = %duration.as_millis(),
                    title = %story.title,
                    "Format request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %self.session_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Format request failed"
                );
            }
        }

        result
    }
}
