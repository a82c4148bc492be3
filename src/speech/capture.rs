//! Speech capture adapter exposed to the conversation layer.

use std::sync::Arc;

use crate::config::SpeechConfig;
use crate::speech::recognizer::{RecognitionError, RecognitionSink, SpeechRecognizer};

/// Microphone input channel: wraps a [`SpeechRecognizer`] and forwards
/// finalized utterances to a single callback.
///
/// ```rust,ignore
/// let capture = SpeechCapture::new(platform_recognizer, config.speech.clone());
/// capture.on_recognized(controller.speech_callback(tokio::runtime::Handle::current()));
/// capture.start()?;
/// ```
pub struct SpeechCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    config: SpeechConfig,
    sink: RecognitionSink,
}

impl SpeechCapture {
    /// Interim results are always switched off, whatever `config` says.
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, mut config: SpeechConfig) -> Self {
        if config.interim_results {
            log::warn!("speech: interim results are not supported, disabling");
            config.interim_results = false;
        }
        Self {
            recognizer,
            config,
            sink: RecognitionSink::default(),
        }
    }

    /// Register the receiver of recognized text, replacing any previous one.
    pub fn on_recognized<F>(&self, callback: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.sink.set_callback(Arc::new(callback));
    }

    /// Start listening.  A no-op while already listening.
    pub fn start(&self) -> Result<(), RecognitionError> {
        if !self.config.enabled {
            return Err(RecognitionError::Disabled);
        }
        if self.is_listening() {
            return Ok(());
        }

        self.sink.clear_heard();
        if let Err(e) = self.recognizer.start(&self.config, self.sink.clone()) {
            log::error!("speech: could not start recognizer: {e}");
            return Err(e);
        }
        self.sink.set_listening(true);
        log::info!("speech: listening ({})", self.config.language);
        Ok(())
    }

    /// Stop listening.  A no-op while not listening.
    pub fn stop(&self) -> Result<(), RecognitionError> {
        if !self.is_listening() {
            return Ok(());
        }

        if let Err(e) = self.recognizer.stop() {
            log::error!("speech: could not stop recognizer: {e}");
            return Err(e);
        }
        self.sink.set_listening(false);
        log::info!("speech: stopped listening");
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.sink.is_listening()
    }

    /// Text recognized since the last [`start`](Self::start).
    pub fn transcript(&self) -> String {
        self.sink.heard()
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::completion::MockCompletionClient;
    use crate::conversation::{ConversationController, ConversationStatus};
    use crate::speech::recognizer::{MockRecognizer, RecognitionResult};
    use crate::transcript::Sender;

    fn capture_with(recognizer: Arc<MockRecognizer>) -> SpeechCapture {
        SpeechCapture::new(recognizer, SpeechConfig::default())
    }

    #[test]
    fn start_and_stop_toggle_listening() {
        let mock = Arc::new(MockRecognizer::new());
        let capture = capture_with(mock.clone());
        assert!(!capture.is_listening());

        capture.start().unwrap();
        assert!(capture.is_listening());
        assert_eq!(mock.language().as_deref(), Some("hi-IN"));

        capture.stop().unwrap();
        assert!(!capture.is_listening());
        assert_eq!((mock.starts(), mock.stops()), (1, 1));
    }

    #[test]
    fn repeated_start_and_stop_are_no_ops() {
        let mock = Arc::new(MockRecognizer::new());
        let capture = capture_with(mock.clone());

        capture.stop().unwrap();
        capture.start().unwrap();
        capture.start().unwrap();
        capture.stop().unwrap();
        capture.stop().unwrap();

        assert_eq!((mock.starts(), mock.stops()), (1, 1));
    }

    #[test]
    fn failed_start_is_reported_and_not_listening() {
        let mock = Arc::new(MockRecognizer::failing(RecognitionError::PermissionDenied));
        let capture = capture_with(mock);

        let err = capture.start().unwrap_err();
        assert!(matches!(err, RecognitionError::PermissionDenied));
        assert!(!capture.is_listening());
    }

    #[test]
    fn disabled_config_refuses_to_start() {
        let mock = Arc::new(MockRecognizer::new());
        let config = SpeechConfig {
            enabled: false,
            ..SpeechConfig::default()
        };
        let capture = SpeechCapture::new(mock.clone(), config);

        assert!(matches!(capture.start(), Err(RecognitionError::Disabled)));
        assert_eq!(mock.starts(), 0);
    }

    #[test]
    fn interim_results_setting_is_forced_off() {
        let config = SpeechConfig {
            interim_results: true,
            ..SpeechConfig::default()
        };
        let capture = SpeechCapture::new(Arc::new(MockRecognizer::new()), config);
        assert!(!capture.config().interim_results);
    }

    #[test]
    fn recognizer_ending_by_itself_clears_listening() {
        let mock = Arc::new(MockRecognizer::new());
        let capture = capture_with(mock.clone());
        capture.start().unwrap();

        mock.sink().ended();
        assert!(!capture.is_listening());

        // Can be restarted afterwards.
        capture.start().unwrap();
        assert_eq!(mock.starts(), 2);
    }

    #[test]
    fn only_final_text_reaches_callback_and_transcript_resets_on_start() {
        let mock = Arc::new(MockRecognizer::new());
        let capture = capture_with(mock.clone());
        let got = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&got);
        capture.on_recognized(move |text| store.lock().unwrap().push(text));

        capture.start().unwrap();
        let sink = mock.sink();
        sink.results(&[RecognitionResult::interim("kya")]);
        sink.results(&[RecognitionResult::final_text("kya haal hai")]);
        assert_eq!(capture.transcript(), "kya haal hai");

        capture.stop().unwrap();
        capture.start().unwrap();
        assert!(capture.transcript().is_empty());
        assert_eq!(*got.lock().unwrap(), vec!["kya haal hai".to_string()]);
    }

    #[test]
    fn recognition_errors_leave_conversation_untouched() {
        let mock = Arc::new(MockRecognizer::new());
        let capture = capture_with(mock.clone());
        capture.start().unwrap();

        mock.sink().error(RecognitionError::Backend("audio-capture".into()));
        assert!(capture.is_listening());
    }

    #[tokio::test]
    async fn recognized_text_drives_the_conversation() {
        let client = Arc::new(MockCompletionClient::ok("Bilkul!"));
        let controller = ConversationController::new(client.clone(), "sys");

        let mock = Arc::new(MockRecognizer::new());
        let capture = capture_with(mock.clone());
        capture.on_recognized(controller.speech_callback(tokio::runtime::Handle::current()));
        capture.start().unwrap();

        mock.sink()
            .results(&[RecognitionResult::final_text("mujhe madad chahiye")]);

        let mut status = controller.subscribe_status();
        for _ in 0..200 {
            if controller.transcript().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        status
            .wait_for(|s| *s == ConversationStatus::Idle)
            .await
            .unwrap();

        let t = controller.transcript();
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].sender, Sender::User);
        assert_eq!(t[0].text, "mujhe madad chahiye");
        assert_eq!(t[1].text, "Bilkul!");
        assert_eq!(client.calls(), 1);
    }
}
