//! Conversation transcript: message types, the ordered store, and the
//! optional persistence slot.
//!
//! ```rust
//! use persona_chat::transcript::{MessageDraft, Transcript};
//!
//! let mut transcript = Transcript::new();
//! let ts = transcript.next_timestamp();
//! let index = transcript.append(MessageDraft::user("namaste", ts)).unwrap();
//! assert_eq!(index, 0);
//!
//! let json = transcript.serialize().unwrap();
//! let restored = Transcript::load_from(&json).unwrap();
//! assert_eq!(restored.all(), transcript.all());
//! ```

pub mod message;
pub mod storage;
pub mod store;

pub use message::{Message, MessageDraft, Sender};
pub use storage::{JsonFileStorage, MemoryStorage, TranscriptStorage};
pub use store::{Transcript, TranscriptError};
