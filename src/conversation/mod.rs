//! Conversation module: the status machine and the controller that owns
//! the transcript.
//!
//! # Architecture
//!
//! ```text
//! typed text ───────────────┐
//! SpeechCapture callback ───┴─▶ ConversationController::submit()
//!                                   │
//!                                   ├─ Transcript (user message)
//!                                   ├─ CompletionClient::complete   ← async
//!                                   └─ Transcript (reply / warning)
//!
//! ConversationController::transcript()       ←── snapshot for the UI
//! watch::Receiver<ConversationStatus>        ←── typing indicator
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use persona_chat::completion::ApiCompletionClient;
//! use persona_chat::config::AppConfig;
//! use persona_chat::conversation::ConversationController;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default().with_env_overrides();
//!     let client = ApiCompletionClient::from_config(&config.completion).unwrap();
//!     let controller =
//!         ConversationController::new(Arc::new(client), config.completion.system_prompt);
//!
//!     controller.submit("namaste!").await;
//!     for message in controller.transcript() {
//!         println!("{:?}: {}", message.sender, message.text);
//!     }
//! }
//! ```

pub mod controller;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{ConversationController, Submission, WARNING_TEXT};
pub use state::ConversationStatus;
