//! Completion module: talks to the chat-completions endpoint.
//!
//! This module provides:
//! * [`CompletionClient`]: async trait implemented by all backends.
//! * [`ApiCompletionClient`]: OpenAI-compatible REST backend.
//! * [`build_request`] / [`parse_completion`]: the wire format.
//! * [`sanitize`]: strips `<think>` reasoning blocks from replies.
//! * [`CompletionError`]: failure variants for a single call.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use persona_chat::completion::{ApiCompletionClient, CompletionClient};
//! use persona_chat::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default().with_env_overrides();
//!     let client = ApiCompletionClient::from_config(&config.completion).unwrap();
//!
//!     let reply = client
//!         .complete(&[], &config.completion.system_prompt)
//!         .await
//!         .unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod client;
pub mod request;
pub mod sanitize;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiCompletionClient, CompletionClient, CompletionError};
pub use request::{build_request, parse_completion, ChatCompletionRequest, ChatMessage};
pub use sanitize::{sanitize, sanitize_reply, FALLBACK_REPLY};

// test-only re-export so the conversation tests can import the mock directly.
#[cfg(test)]
pub use client::MockCompletionClient;
