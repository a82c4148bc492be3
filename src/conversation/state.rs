//! Conversation status machine and shared conversation state.
//!
//! [`ConversationStatus`] drives the controller's submission guard and the
//! UI's typing indicator.  Inside the crate it is paired with the
//! [`Transcript`] behind one lock that only the controller writes through;
//! readers get copies.

use std::sync::{Arc, Mutex};

use crate::transcript::Transcript;

// ---------------------------------------------------------------------------
// ConversationStatus
// ---------------------------------------------------------------------------

/// States of one conversation.
///
/// ```text
/// Idle ──submit──▶ Sending ──user message appended──▶ AwaitingResponse
///                                                      ├─ reply ──▶ Idle
///                                                      └─ failure ─▶ Error ─▶ Idle
/// ```
///
/// `Error` is transient: the controller leaves it as soon as the warning
/// message has been appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationStatus {
    /// Ready for the next submission.
    #[default]
    Idle,

    /// The user message is being appended.
    Sending,

    /// A completion request is outstanding.
    AwaitingResponse,

    /// The last request failed; a warning is being appended.
    Error,
}

impl ConversationStatus {
    /// Returns `true` while a submission is being processed.
    ///
    /// ```
    /// use persona_chat::conversation::ConversationStatus;
    ///
    /// assert!(!ConversationStatus::Idle.is_busy());
    /// assert!(ConversationStatus::Sending.is_busy());
    /// assert!(ConversationStatus::AwaitingResponse.is_busy());
    /// assert!(!ConversationStatus::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ConversationStatus::Sending | ConversationStatus::AwaitingResponse
        )
    }

    /// Whether `submit` is accepted in this state.
    pub fn accepts_input(&self) -> bool {
        !self.is_busy()
    }

    /// Short label for a status bar or typing indicator.
    pub fn label(&self) -> &'static str {
        match self {
            ConversationStatus::Idle => "Idle",
            ConversationStatus::Sending => "Sending",
            ConversationStatus::AwaitingResponse => "Typing...",
            ConversationStatus::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationState
// ---------------------------------------------------------------------------

/// Status and transcript, guarded together so the busy check and the
/// user-message append are one step.  Only the controller touches it.
#[derive(Debug, Default)]
pub(crate) struct ConversationState {
    pub(crate) status: ConversationStatus,
    pub(crate) transcript: Transcript,
}

impl ConversationState {
    pub(crate) fn new(transcript: Transcript) -> Self {
        Self {
            status: ConversationStatus::Idle,
            transcript,
        }
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`ConversationState`].
///
/// Cheap to clone.  Lock for a short critical section only; never hold the
/// lock across `.await` points.
pub(crate) type SharedState = Arc<Mutex<ConversationState>>;

pub(crate) fn new_shared_state(transcript: Transcript) -> SharedState {
    Arc::new(Mutex::new(ConversationState::new(transcript)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_and_error_accept_input() {
        assert!(ConversationStatus::Idle.accepts_input());
        assert!(ConversationStatus::Error.accepts_input());
        assert!(!ConversationStatus::Sending.accepts_input());
        assert!(!ConversationStatus::AwaitingResponse.accepts_input());
    }

    #[test]
    fn awaiting_response_shows_typing_indicator() {
        assert_eq!(ConversationStatus::AwaitingResponse.label(), "Typing...");
        assert_eq!(ConversationStatus::Idle.label(), "Idle");
    }

    #[test]
    fn default_status_is_idle() {
        assert_eq!(ConversationStatus::default(), ConversationStatus::Idle);
        let state = ConversationState::default();
        assert_eq!(state.status, ConversationStatus::Idle);
        assert!(state.transcript.is_empty());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }
}
