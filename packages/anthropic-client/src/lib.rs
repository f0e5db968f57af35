//! Minimal Anthropic Messages API client
//!
//! A small typed client for `POST /v1/messages`, with no domain-specific
//! logic.
//!
//! # Example
//!
//! ```rust,ignore
//! use anthropic_client::{AnthropicClient, Message, MessagesRequest};
//!
//! let client = AnthropicClient::from_env()?;
//!
//! let response = client
//!     .messages(
//!         MessagesRequest::new("claude-sonnet-4-20250514", 500)
//!             .system("You summarize court opinions.")
//!             .message(Message::user("...")),
//!     )
//!     .await?;
//! println!("{}", response.text());
//! ```

pub mod error;
pub mod types;

pub use error::{AnthropicError, Result};
pub use types::*;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct AnthropicClient {
    http_client: Client,
    api_key: SecretString,
    base_url: String,
}

impl AnthropicClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_secret(SecretString::new(api_key.into().into_boxed_str()))
    }

    /// Create a client from an already-wrapped secret.
    pub fn with_secret(api_key: SecretString) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http_client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnthropicError::Config("ANTHROPIC_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Send a Messages API request.
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Anthropic request failed");
                AnthropicError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body);
            warn!(status = %status, error = %message, "Anthropic API error");
            return Err(AnthropicError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AnthropicError::Parse(e.to_string()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            output_tokens = parsed.usage.map(|u| u.output_tokens).unwrap_or_default(),
            "Anthropic messages call"
        );

        Ok(parsed)
    }
}

impl Clone for AnthropicClient {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            api_key: SecretString::new(self.api_key.expose_secret().into()),
            base_url: self.base_url.clone(),
        }
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Pull the human-readable message out of an error body, if it has one.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<types::ErrorEnvelope>(body) {
        Ok(envelope) => format!("{}: {}", envelope.error.kind, envelope.error.message),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = AnthropicClient::new("sk-ant-test").with_base_url("http://localhost:9999/");

        assert_eq!(client.api_key.expose_secret(), "sk-ant-test");
        assert_eq!(client.base_url(), "http://localhost:9999");
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = AnthropicClient::new("sk-ant-secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(api_error_message(body), "overloaded_error: Overloaded");
        assert_eq!(api_error_message("bad gateway"), "bad gateway");
        assert_eq!(api_error_message(""), "empty response body");
    }

    #[test]
    fn test_transient_errors() {
        let overloaded = AnthropicError::Api {
            status: 529,
            message: "overloaded".into(),
        };
        assert!(overloaded.is_transient());
        assert!(!AnthropicError::Config("no key".into()).is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = AnthropicClient::new("sk-ant-test").with_base_url("http://127.0.0.1:1");
        let err = client
            .messages(MessagesRequest::new("m", 10).message(Message::user("hi")))
            .await
            .unwrap_err();
        assert!(matches!(err, AnthropicError::Network(_)));
    }
}
