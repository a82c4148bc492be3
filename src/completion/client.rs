//! Core `CompletionClient` trait and `ApiCompletionClient` implementation.
//!
//! `ApiCompletionClient` calls any OpenAI-compatible `chat/completions`
//! endpoint (OpenRouter by default).  All connection details come from
//! [`CompletionConfig`]; nothing is read from the environment here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

use crate::config::CompletionConfig;
use crate::completion::request::{build_request, parse_completion};
use crate::transcript::Message;

// ---------------------------------------------------------------------------
// CompletionError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the completion endpoint.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The host-configured timeout elapsed.
    #[error("completion request timed out")]
    Timeout,

    /// The endpoint answered with a non-2xx status.
    #[error("completion endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse completion response: {0}")]
    Parse(String),

    /// A configured header value or client setting is unusable.
    #[error("invalid completion client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CompletionClient trait
// ---------------------------------------------------------------------------

/// Produces the next assistant reply for a transcript.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn CompletionClient>`.  Each call issues at most one outbound
/// request and never retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        transcript: &[Message],
        system_prompt: &str,
    ) -> Result<String, CompletionError>;
}

// ---------------------------------------------------------------------------
// ApiCompletionClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `chat/completions` endpoint with bearer auth
/// and the `HTTP-Referer` / `X-Title` attribution headers.
pub struct ApiCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    headers: HeaderMap,
}

impl std::fmt::Debug for ApiCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ApiCompletionClient {
    /// Build a client from config.  A timeout is applied only when
    /// `config.timeout_secs` is set.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| CompletionError::Config(e.to_string()))?;

        Self::with_http_client(config, client)
    }

    /// Build around an existing `reqwest::Client`.
    pub fn with_http_client(
        config: &CompletionConfig,
        client: reqwest::Client,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            headers: build_headers(config)?,
        })
    }
}

/// Authorization is attached only when the key is a non-empty string.
fn build_headers(config: &CompletionConfig) -> Result<HeaderMap, CompletionError> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("http-referer"),
        HeaderValue::from_str(&config.referer)
            .map_err(|e| CompletionError::Config(format!("HTTP-Referer: {e}")))?,
    );
    headers.insert(
        HeaderName::from_static("x-title"),
        HeaderValue::from_str(&config.title)
            .map_err(|e| CompletionError::Config(format!("X-Title: {e}")))?,
    );

    let key = config.api_key.as_deref().unwrap_or("").trim();
    if !key.is_empty() {
        let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| CompletionError::Config(format!("Authorization: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

#[async_trait]
impl CompletionClient for ApiCompletionClient {
    async fn complete(
        &self,
        transcript: &[Message],
        system_prompt: &str,
    ) -> Result<String, CompletionError> {
        let body = build_request(transcript, system_prompt, &self.model);
        log::debug!(
            "completion: POST {} ({} turns)",
            self.endpoint,
            body.messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::warn!("completion: endpoint returned {status}");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply = parse_completion(&text)?;
        log::debug!("completion: reply received (len={})", reply.len());
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// MockCompletionClient  (test-only)
// ---------------------------------------------------------------------------

/// A test double that answers from a pre-configured result without any
/// network access, counting calls and remembering the last transcript.
#[cfg(test)]
pub struct MockCompletionClient {
    reply: Option<String>,
    calls: std::sync::atomic::AtomicUsize,
    last_transcript: std::sync::Mutex<Vec<Message>>,
}

#[cfg(test)]
impl MockCompletionClient {
    /// Always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            calls: Default::default(),
            last_transcript: Default::default(),
        }
    }

    /// Always fails with a transport error.
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Default::default(),
            last_transcript: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn last_transcript(&self) -> Vec<Message> {
        self.last_transcript.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        transcript: &[Message],
        _system_prompt: &str,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last_transcript.lock().unwrap() = transcript.to_vec();
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(CompletionError::Request("connection refused".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
