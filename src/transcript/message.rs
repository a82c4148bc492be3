//! Message types held by the [`Transcript`](crate::transcript::Transcript).

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Chat-completions role name for this sender.
    pub fn role(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// One immutable entry in the conversation.
///
/// Created only by [`Transcript::append`](crate::transcript::Transcript::append),
/// which assigns `sequence_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sequence_index: u64,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Set on the warning bubble appended after a failed completion.
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    /// Local wall-clock time shown under the bubble, e.g. `"14:03:27"`.
    pub fn display_time(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// A message that has not been appended yet (no index assigned).
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_error: bool,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            created_at,
            is_error: false,
        }
    }

    pub fn assistant(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            created_at,
            is_error: false,
        }
    }

    /// Assistant-authored warning, visibly marked as an error.
    pub fn warning(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(text, created_at)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_match_wire_names() {
        assert_eq!(Sender::User.role(), "user");
        assert_eq!(Sender::Assistant.role(), "assistant");
    }

    #[test]
    fn warning_draft_is_assistant_error() {
        let d = MessageDraft::warning("oops", Utc::now());
        assert_eq!(d.sender, Sender::Assistant);
        assert!(d.is_error);
    }

    #[test]
    fn is_error_defaults_to_false_when_absent() {
        let json = r#"{"sequence_index":3,"sender":"user","text":"hi","created_at":"2024-05-01T10:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sequence_index, 3);
        assert_eq!(msg.sender, Sender::User);
        assert!(!msg.is_error);
    }

    #[test]
    fn display_time_is_clock_formatted() {
        let msg = Message {
            sequence_index: 0,
            sender: Sender::User,
            text: "hi".into(),
            created_at: Utc::now(),
            is_error: false,
        };
        let shown = msg.display_time();
        assert_eq!(shown.len(), 8);
        assert_eq!(shown.matches(':').count(), 2);
    }
}
