//! Speech input channel.
//!
//! # Architecture
//!
//! ```text
//! platform recognizer (impl SpeechRecognizer)
//!        │ results / error / ended
//!        ▼
//! RecognitionSink ── final results only ──▶ on_recognized callback
//!        ▲                                    (ConversationController::speech_callback)
//!        │
//! SpeechCapture: start() / stop() / is_listening() / transcript()
//! ```
//!
//! The acoustic recognition itself is supplied by the host; this module only
//! decides what counts as a finished utterance and where it goes.

pub mod capture;
pub mod recognizer;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use capture::SpeechCapture;
pub use recognizer::{RecognitionError, RecognitionResult, RecognitionSink, SpeechRecognizer};
