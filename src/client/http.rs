//! HTTP implementation of the story service clients

use super::types::{
    ErrorResponse, FormatRequest, FormatResponse, GenerationRequest, GenerationResponse,
};
use super::{ClientError, FormatterClient, GenerationClient};
use crate::story::FormattedStory;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the story service's `/generate` and `/format-story` endpoints
#[derive(Clone)]
pub struct StoryApiClient {
    client: Client,
    base_url: String,
}

impl StoryApiClient {
    /// Create a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built (TLS backend
    /// initialization).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ClientError::network(format!("Connection failed: {e}"))
                } else {
                    ClientError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or_else(|_| body.trim().to_string(), |err| err.error);
            return Err(ClientError::from_status(status.as_u16(), &message));
        }

        serde_json::from_str(&body).map_err(|e| {
            ClientError::malformed_response(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl GenerationClient for StoryApiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let response: GenerationResponse = self.post_json("generate", request).await?;

        if response.response.trim().is_empty() {
            return Err(ClientError::malformed_response(
                "Generation service returned an empty continuation",
            ));
        }
        Ok(response.response)
    }
}

#[async_trait]
impl FormatterClient for StoryApiClient {
    async fn format(&self, full_story: &str) -> Result<FormattedStory, ClientError> {
        let response: FormatResponse = self
            .post_json("format-story", &FormatRequest { story_text: full_story })
            .await?;

        Ok(FormattedStory {
            title: response.title,
            formatted_story: response.formatted_story,
        })
    }
}
