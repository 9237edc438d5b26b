//! Text-completion service client.
//!
//! One operation: prompt in, completion out. Callers must tolerate any
//! failure here and fall back to static templates - metadata generation
//! never blocks a finished video.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::TextSettings;

/// Errors from the completion service.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),

    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion service returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Completion response had no text content")]
    EmptyResponse,
}

/// Result type for completion operations.
pub type TextResult<T> = Result<T, TextError>;

/// Seam for metadata generation: anything that can complete a prompt.
pub trait TextComplete {
    fn complete(&self, prompt: &str) -> TextResult<String>;
}

/// HTTP client for an OpenAI-style chat completion endpoint.
pub struct TextClient {
    settings: TextSettings,
    http: reqwest::blocking::Client,
}

impl TextClient {
    /// Build a client with the configured request timeout.
    pub fn new(settings: TextSettings) -> TextResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { settings, http })
    }

    fn api_key(&self) -> TextResult<String> {
        std::env::var(&self.settings.api_key_env)
            .map_err(|_| TextError::MissingApiKey(self.settings.api_key_env.clone()))
    }
}

impl TextComplete for TextClient {
    fn complete(&self, prompt: &str) -> TextResult<String> {
        let api_key = self.api_key()?;

        let body = json!({
            "model": self.settings.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7,
        });

        let response = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TextError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json()?;
        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TextError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_detected() {
        let settings = TextSettings {
            api_key_env: "HUSHLOOP_TEST_NO_SUCH_KEY".to_string(),
            ..TextSettings::default()
        };
        let client = TextClient::new(settings).unwrap();
        assert!(matches!(
            client.complete("hello"),
            Err(TextError::MissingApiKey(_))
        ));
    }
}
