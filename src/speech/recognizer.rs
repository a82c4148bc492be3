//! Platform speech-recognition seam.
//!
//! [`SpeechRecognizer`] is implemented by the host platform (browser speech
//! API, OS dictation service, …).  The recognizer pushes what it hears into
//! the [`RecognitionSink`] it receives on `start`; the sink keeps final
//! results only and hands them to the registered callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// RecognitionError
// ---------------------------------------------------------------------------

/// Errors reported by a speech recognizer.  They never affect the
/// conversation; the user can always type instead.
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    /// The platform offers no speech recognition.
    #[error("speech recognition is not supported on this platform")]
    Unsupported,

    /// Speech input is switched off in the settings.
    #[error("speech input is disabled")]
    Disabled,

    /// The user refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// Any other recognizer failure (network, audio capture, no speech …).
    #[error("speech recognition failed: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// RecognitionResult
// ---------------------------------------------------------------------------

/// One hypothesis delivered by the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub transcript: String,
    /// `false` for interim hypotheses, which are never forwarded.
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }

    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// The platform capability wrapped by [`SpeechCapture`](crate::speech::SpeechCapture).
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn SpeechRecognizer>`.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin listening in `config.language`, reporting into `sink`.
    fn start(&self, config: &SpeechConfig, sink: RecognitionSink) -> Result<(), RecognitionError>;

    /// Stop listening.  The recognizer should call
    /// [`RecognitionSink::ended`] once it has shut down.
    fn stop(&self) -> Result<(), RecognitionError>;
}

// Compile-time assertion: Box<dyn SpeechRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

// ---------------------------------------------------------------------------
// RecognitionSink
// ---------------------------------------------------------------------------

pub(crate) type RecognizedCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct SinkShared {
    listening: AtomicBool,
    callback: RwLock<Option<RecognizedCallback>>,
    heard: Mutex<String>,
}

/// Receiving end handed to the recognizer.  Cheap to clone.
#[derive(Clone, Default)]
pub struct RecognitionSink {
    shared: Arc<SinkShared>,
}

impl std::fmt::Debug for RecognitionSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionSink")
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

impl RecognitionSink {
    /// Deliver a batch of results.  Final results are joined with single
    /// spaces and forwarded as one utterance; interim results are dropped.
    pub fn results(&self, batch: &[RecognitionResult]) {
        let text = batch
            .iter()
            .filter(|r| r.is_final)
            .map(|r| r.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            return;
        }

        {
            let mut heard = self.shared.heard.lock().unwrap_or_else(PoisonError::into_inner);
            if !heard.is_empty() {
                heard.push(' ');
            }
            heard.push_str(&text);
        }

        let callback = self
            .shared
            .callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match callback {
            Some(callback) => {
                log::debug!("speech: forwarding recognized text (len={})", text.len());
                callback(text);
            }
            None => log::debug!("speech: recognized text dropped, no listener registered"),
        }
    }

    /// Report a recognizer failure.  Logged only.
    pub fn error(&self, err: RecognitionError) {
        log::error!("speech: recognition error: {err}");
    }

    /// The recognizer has stopped (on request, or by itself).
    pub fn ended(&self) {
        log::debug!("speech: recognizer ended");
        self.shared.listening.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::SeqCst)
    }

    pub(crate) fn set_listening(&self, listening: bool) {
        self.shared.listening.store(listening, Ordering::SeqCst);
    }

    pub(crate) fn set_callback(&self, callback: RecognizedCallback) {
        *self
            .shared
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    pub(crate) fn heard(&self) -> String {
        self.shared
            .heard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn clear_heard(&self) {
        self.shared
            .heard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double standing in for the platform recognizer.  Tests drive it
/// through the sink it captured on `start`.
#[cfg(test)]
#[derive(Default)]
pub struct MockRecognizer {
    fail_start: Option<RecognitionError>,
    sink: Mutex<Option<RecognitionSink>>,
    language: Mutex<Option<String>>,
    starts: std::sync::atomic::AtomicUsize,
    stops: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recognizer whose `start` always fails with `err`.
    pub fn failing(err: RecognitionError) -> Self {
        Self {
            fail_start: Some(err),
            ..Self::default()
        }
    }

    pub fn sink(&self) -> RecognitionSink {
        self.sink
            .lock()
            .unwrap()
            .clone()
            .expect("recognizer was never started")
    }

    pub fn language(&self) -> Option<String> {
        self.language.lock().unwrap().clone()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl SpeechRecognizer for MockRecognizer {
    fn start(&self, config: &SpeechConfig, sink: RecognitionSink) -> Result<(), RecognitionError> {
        if let Some(err) = &self.fail_start {
            return Err(err.clone());
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.language.lock().unwrap() = Some(config.language.clone());
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop(&self) -> Result<(), RecognitionError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.ended();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
