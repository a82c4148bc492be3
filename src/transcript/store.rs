//! Append-only, ordered message log.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::message::{Message, MessageDraft};

/// Errors raised by [`Transcript`].
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// A caller broke an ordering invariant.  Not expected in normal
    /// operation.
    #[error("transcript invariant violated: {0}")]
    InvariantViolation(String),

    /// The serialized form could not be produced or parsed.
    #[error("transcript encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Ordered sequence of [`Message`]s.  Insertion order is conversation order;
/// nothing is ever reordered, edited or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
    next_index: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `draft`, assigning it the next sequence index.
    ///
    /// # Errors
    ///
    /// [`TranscriptError::InvariantViolation`] when `draft.created_at` is
    /// earlier than the last message's timestamp.
    pub fn append(&mut self, draft: MessageDraft) -> Result<u64, TranscriptError> {
        if let Some(last) = self.messages.last() {
            if draft.created_at < last.created_at {
                return Err(TranscriptError::InvariantViolation(format!(
                    "message timestamp {} precedes last message #{} at {}",
                    draft.created_at, last.sequence_index, last.created_at
                )));
            }
        }

        let index = self.next_index;
        self.messages.push(Message {
            sequence_index: index,
            sender: draft.sender,
            text: draft.text,
            created_at: draft.created_at,
            is_error: draft.is_error,
        });
        self.next_index += 1;
        Ok(index)
    }

    /// Snapshot copy of every message, in order.
    pub fn all(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Current time, clamped so it never precedes the last message.
    pub fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.messages.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        }
    }

    /// JSON array of messages.
    pub fn serialize(&self) -> Result<String, TranscriptError> {
        Ok(serde_json::to_string(&self.messages)?)
    }

    /// Rebuild a transcript from [`serialize`](Self::serialize) output.
    ///
    /// Rejects data whose indices are not strictly increasing or whose
    /// timestamps go backwards.
    pub fn load_from(serialized: &str) -> Result<Self, TranscriptError> {
        let messages: Vec<Message> = serde_json::from_str(serialized)?;

        for pair in messages.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.sequence_index <= prev.sequence_index {
                return Err(TranscriptError::InvariantViolation(format!(
                    "sequence index {} follows {}",
                    next.sequence_index, prev.sequence_index
                )));
            }
            if next.created_at < prev.created_at {
                return Err(TranscriptError::InvariantViolation(format!(
                    "message #{} is older than message #{}",
                    next.sequence_index, prev.sequence_index
                )));
            }
        }

        let next_index = messages.last().map_or(0, |m| m.sequence_index + 1);
        Ok(Self {
            messages,
            next_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Sender;
    use chrono::Duration;

    fn sample() -> Transcript {
        let t0 = Utc::now();
        let mut t = Transcript::new();
        t.append(MessageDraft::user("namaste", t0)).unwrap();
        t.append(MessageDraft::assistant("Hello! 😊", t0 + Duration::seconds(2)))
            .unwrap();
        t.append(MessageDraft::user("how are you?\nline two", t0 + Duration::seconds(5)))
            .unwrap();
        t.append(MessageDraft::warning("⚠️ failed", t0 + Duration::seconds(6)))
            .unwrap();
        t
    }

    #[test]
    fn append_assigns_increasing_indices() {
        let now = Utc::now();
        let mut t = Transcript::new();
        assert_eq!(t.append(MessageDraft::user("a", now)).unwrap(), 0);
        assert_eq!(t.append(MessageDraft::assistant("b", now)).unwrap(), 1);
        assert_eq!(t.append(MessageDraft::assistant("c", now)).unwrap(), 2);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn append_rejects_older_timestamp() {
        let now = Utc::now();
        let mut t = Transcript::new();
        t.append(MessageDraft::user("a", now)).unwrap();

        let err = t
            .append(MessageDraft::assistant("b", now - Duration::seconds(1)))
            .unwrap_err();
        assert!(matches!(err, TranscriptError::InvariantViolation(_)));
        assert_eq!(t.len(), 1);

        // The failed append must not consume an index.
        assert_eq!(t.append(MessageDraft::assistant("c", now)).unwrap(), 1);
    }

    #[test]
    fn all_returns_a_detached_snapshot() {
        let mut t = sample();
        let snap = t.all();
        t.append(MessageDraft::user("later", t.next_timestamp())).unwrap();

        assert_eq!(snap.len(), 4);
        assert_eq!(t.len(), 5);
        assert_eq!(snap.iter().count(), snap.iter().count());
    }

    #[test]
    fn serialize_load_preserves_messages() {
        let t = sample();
        let restored = Transcript::load_from(&t.serialize().unwrap()).unwrap();

        assert_eq!(restored.len(), t.len());
        for (a, b) in t.iter().zip(restored.iter()) {
            assert_eq!(a.sequence_index, b.sequence_index);
            assert_eq!(a.sender, b.sender);
            assert_eq!(a.text, b.text);
            assert_eq!(a.is_error, b.is_error);
        }
    }

    #[test]
    fn loaded_transcript_continues_numbering() {
        let t = sample();
        let mut restored = Transcript::load_from(&t.serialize().unwrap()).unwrap();
        let ts = restored.next_timestamp();
        assert_eq!(restored.append(MessageDraft::user("again", ts)).unwrap(), 4);
    }

    #[test]
    fn load_empty_array_gives_empty_transcript() {
        let t = Transcript::load_from("[]").unwrap();
        assert!(t.is_empty());
        assert_eq!(t, Transcript::new());
    }

    #[test]
    fn load_rejects_malformed_json() {
        let err = Transcript::load_from("{not json").unwrap_err();
        assert!(matches!(err, TranscriptError::Encoding(_)));
    }

    #[test]
    fn load_rejects_out_of_order_indices() {
        let json = r#"[
            {"sequence_index":1,"sender":"user","text":"a","created_at":"2024-05-01T10:00:00Z"},
            {"sequence_index":1,"sender":"assistant","text":"b","created_at":"2024-05-01T10:00:01Z"}
        ]"#;
        let err = Transcript::load_from(json).unwrap_err();
        assert!(matches!(err, TranscriptError::InvariantViolation(_)));
    }

    #[test]
    fn load_rejects_backwards_timestamps() {
        let json = r#"[
            {"sequence_index":0,"sender":"user","text":"a","created_at":"2024-05-01T10:00:05Z"},
            {"sequence_index":1,"sender":"assistant","text":"b","created_at":"2024-05-01T10:00:01Z"}
        ]"#;
        assert!(Transcript::load_from(json).is_err());
    }

    #[test]
    fn next_timestamp_never_precedes_last_message() {
        let future = Utc::now() + Duration::hours(1);
        let mut t = Transcript::new();
        t.append(MessageDraft::user("from the future", future)).unwrap();

        let ts = t.next_timestamp();
        assert!(ts >= future);
        assert!(t.append(MessageDraft::assistant("ok", ts)).is_ok());
        assert_eq!(t.last().map(|m| m.sender), Some(Sender::Assistant));
    }
}
