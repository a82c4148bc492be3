//! Conversation controller: drives user input → completion → reply.
//!
//! # Flow
//!
//! ```text
//! submit(text)
//!   ├─ blank text, or status busy ─▶ ignored (nothing appended, no call)
//!   └─ Sending: append user message
//!        └─ AwaitingResponse: CompletionClient::complete   (only suspension point)
//!              ├─ Ok  → append sanitized reply              → Idle
//!              └─ Err → Error, append warning bubble        → Idle
//! ```
//!
//! The status check and the user-message append happen under one lock, so
//! at most one completion request is ever outstanding per conversation.  A
//! `submit` future dropped mid-request (host timeout, `select!`, shutdown)
//! settles like a failed request: warning bubble, then `Idle`.
//!
//! Storage writes happen after the state lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::completion::CompletionClient;
use crate::transcript::{Message, MessageDraft, Transcript, TranscriptStorage};

use super::state::{new_shared_state, ConversationState, ConversationStatus, SharedState};

/// Text of the assistant bubble appended when a completion fails.
pub const WARNING_TEXT: &str = "⚠️ Error fetching response. Try again!";

/// What happened to a call to [`ConversationController::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Blank text, or a request was already in flight.  Nothing changed.
    Ignored,
    /// The assistant reply was appended.
    Replied,
    /// The request failed and the warning bubble was appended.
    Recovered,
}

/// Owns one conversation and is the only writer of its transcript.
///
/// Clones share the same conversation, so typed input and recognized speech
/// can submit concurrently; the status guard decides which one runs.
#[derive(Clone)]
pub struct ConversationController {
    state: SharedState,
    client: Arc<dyn CompletionClient>,
    system_prompt: Arc<str>,
    storage: Option<Arc<dyn TranscriptStorage>>,
    /// Message count of the last snapshot written to `storage`.
    saved: Arc<Mutex<usize>>,
    status_tx: Arc<watch::Sender<ConversationStatus>>,
}

impl ConversationController {
    /// Start an empty, unpersisted conversation.
    pub fn new(client: Arc<dyn CompletionClient>, system_prompt: impl Into<String>) -> Self {
        Self::with_transcript(client, system_prompt.into(), Transcript::new(), None)
    }

    /// Rehydrate from `storage` (read once) and write back after every
    /// append.  Unreadable or invalid stored data starts an empty transcript.
    pub fn restore(
        client: Arc<dyn CompletionClient>,
        system_prompt: impl Into<String>,
        storage: Arc<dyn TranscriptStorage>,
    ) -> Self {
        let transcript = match storage.load() {
            Ok(Some(json)) => match Transcript::load_from(&json) {
                Ok(transcript) => {
                    log::info!("conversation: restored {} messages", transcript.len());
                    transcript
                }
                Err(e) => {
                    log::warn!("conversation: discarding stored transcript: {e}");
                    Transcript::new()
                }
            },
            Ok(None) => Transcript::new(),
            Err(e) => {
                log::warn!("conversation: could not read stored transcript: {e}");
                Transcript::new()
            }
        };

        Self::with_transcript(client, system_prompt.into(), transcript, Some(storage))
    }

    fn with_transcript(
        client: Arc<dyn CompletionClient>,
        system_prompt: String,
        transcript: Transcript,
        storage: Option<Arc<dyn TranscriptStorage>>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConversationStatus::Idle);
        Self {
            saved: Arc::new(Mutex::new(transcript.len())),
            state: new_shared_state(transcript),
            client,
            system_prompt: system_prompt.into(),
            storage,
            status_tx: Arc::new(status_tx),
        }
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn status(&self) -> ConversationStatus {
        self.lock().status
    }

    /// Status changes, for typing indicators.
    pub fn subscribe_status(&self) -> watch::Receiver<ConversationStatus> {
        self.status_tx.subscribe()
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<Message> {
        self.lock().transcript.all()
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Submit user text.
    ///
    /// Blank text, or text arriving while a request is in flight, is
    /// silently ignored.  Otherwise exactly one completion call is made and
    /// exactly one assistant message (reply or warning) is appended.
    pub async fn submit(&self, text: &str) -> Submission {
        let text = text.trim();
        if text.is_empty() {
            log::debug!("conversation: blank submission ignored");
            return Submission::Ignored;
        }

        let (snapshot, pending) = {
            let mut st = self.lock();
            if !st.status.accepts_input() {
                log::debug!(
                    "conversation: submission ignored while {}",
                    st.status.label()
                );
                return Submission::Ignored;
            }

            self.set_status(&mut st, ConversationStatus::Sending);
            let ts = st.transcript.next_timestamp();
            if !self.append(&mut st, MessageDraft::user(text, ts)) {
                self.set_status(&mut st, ConversationStatus::Idle);
                return Submission::Ignored;
            }
            self.set_status(&mut st, ConversationStatus::AwaitingResponse);
            (st.transcript.all(), self.pending_save(&st.transcript))
        };
        self.save(pending);

        let in_flight = InFlight::new(self);
        let result = self.client.complete(&snapshot, &self.system_prompt).await;
        in_flight.disarm();

        match result {
            Ok(reply) => self.settle(Some(reply)),
            Err(e) => {
                log::warn!("conversation: completion failed: {e}");
                self.settle(None)
            }
        }
    }

    /// Callback for [`SpeechCapture::on_recognized`](crate::speech::SpeechCapture::on_recognized).
    ///
    /// Recognized text is submitted exactly like typed text, on `runtime`.
    pub fn speech_callback(&self, runtime: Handle) -> impl Fn(String) + Send + Sync + 'static {
        let controller = self.clone();
        move |text: String| {
            let controller = controller.clone();
            runtime.spawn(async move {
                controller.submit(&text).await;
            });
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append the reply, or the warning bubble when there is none, and
    /// return to `Idle`.
    fn settle(&self, reply: Option<String>) -> Submission {
        let (outcome, pending) = {
            let mut st = self.lock();
            let ts = st.transcript.next_timestamp();
            let outcome = match reply {
                Some(reply) => {
                    self.append(&mut st, MessageDraft::assistant(reply, ts));
                    Submission::Replied
                }
                None => {
                    self.set_status(&mut st, ConversationStatus::Error);
                    self.append(&mut st, MessageDraft::warning(WARNING_TEXT, ts));
                    Submission::Recovered
                }
            };
            self.set_status(&mut st, ConversationStatus::Idle);
            (outcome, self.pending_save(&st.transcript))
        };
        self.save(pending);
        outcome
    }

    fn set_status(&self, st: &mut ConversationState, status: ConversationStatus) {
        log::debug!("conversation: {} → {}", st.status.label(), status.label());
        st.status = status;
        self.status_tx.send_replace(status);
    }

    /// Returns `false` (after logging) when the transcript rejects the
    /// message.
    fn append(&self, st: &mut ConversationState, draft: MessageDraft) -> bool {
        match st.transcript.append(draft) {
            Ok(index) => {
                log::debug!("conversation: appended message #{index}");
                true
            }
            Err(e) => {
                log::error!("conversation: {e}");
                false
            }
        }
    }

    /// Serialize under the state lock; [`save`](Self::save) writes it later.
    fn pending_save(&self, transcript: &Transcript) -> Option<PendingSave> {
        self.storage.as_ref()?;
        match transcript.serialize() {
            Ok(json) => Some(PendingSave {
                messages: transcript.len(),
                json,
            }),
            Err(e) => {
                log::warn!("conversation: could not serialize transcript: {e}");
                None
            }
        }
    }

    /// Must be called without the state lock held.  A snapshot no newer than
    /// the last one written is skipped.
    fn save(&self, pending: Option<PendingSave>) {
        let (Some(storage), Some(pending)) = (&self.storage, pending) else {
            return;
        };
        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.messages <= *saved {
            return;
        }
        match storage.save(&pending.json) {
            Ok(()) => *saved = pending.messages,
            Err(e) => log::warn!("conversation: could not save transcript: {e}"),
        }
    }
}

struct PendingSave {
    messages: usize,
    json: String,
}

// ---------------------------------------------------------------------------
// InFlight
// ---------------------------------------------------------------------------

/// Held across the completion call.  If the `submit` future is dropped
/// before the call returns, the conversation settles as if it had failed.
struct InFlight<'a> {
    controller: &'a ConversationController,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(controller: &'a ConversationController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("conversation: request abandoned before a reply arrived");
            self.controller.settle(None);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
