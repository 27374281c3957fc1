//! Configuration from the environment

use std::time::Duration;
use thiserror::Error;

/// Where the story service listens by default
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_FORMAT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

/// Deadlines for the two remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub generate: Duration,
    pub format: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            generate: DEFAULT_GENERATE_TIMEOUT,
            format: DEFAULT_FORMAT_TIMEOUT,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryConfig {
    /// Base URL of the story service (`/generate`, `/format-story`)
    pub api_url: String,
    pub timeouts: SessionTimeouts,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeouts: SessionTimeouts::default(),
        }
    }
}

impl StoryConfig {
    /// Read `STORY_API_URL`, `STORY_GENERATE_TIMEOUT_SECS` and
    /// `STORY_FORMAT_TIMEOUT_SECS`, falling back to defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`StoryConfig::from_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = match lookup("STORY_API_URL") {
            Some(value) => parse_url("STORY_API_URL", &value)?,
            None => DEFAULT_API_URL.to_string(),
        };

        let generate = match lookup("STORY_GENERATE_TIMEOUT_SECS") {
            Some(value) => parse_timeout("STORY_GENERATE_TIMEOUT_SECS", &value)?,
            None => DEFAULT_GENERATE_TIMEOUT,
        };

        let format = match lookup("STORY_FORMAT_TIMEOUT_SECS") {
            Some(value) => parse_timeout("STORY_FORMAT_TIMEOUT_SECS", &value)?,
            None => DEFAULT_FORMAT_TIMEOUT,
        };

        Ok(Self {
            api_url,
            timeouts: SessionTimeouts { generate, format },
        })
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            var,
            value: value.to_string(),
        })
    }
}

fn parse_timeout(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            var,
            value: value.to_string(),
        }),
    }
}
