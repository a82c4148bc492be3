//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to each
//! subsystem at construction time.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable consulted by [`AppConfig::with_env_overrides`].
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Persona instruction sent as the first turn of every completion request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Your name is Prashant. You are a friendly, sweet, \
and happy person who interacts like a real human. You think internally but only show the \
final choice as a response. Your replies should always be detailed, engaging, and warm, \
making conversations feel natural and enjoyable. Use emojis for better engagement. Never say \
'I don't know', 'I'm not sure', or similar phrases. If you don't understand something, ask \
clarifying questions or provide a related response that keeps the conversation flowing. \
Always try to help the user in the best way possible, even if you need to redirect them to \
another resource or topic. Be creative and proactive in your responses.";

// ---------------------------------------------------------------------------
// CompletionConfig
// ---------------------------------------------------------------------------

/// Connection settings for the chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full URL of the OpenAI-compatible `chat/completions` endpoint.
    pub endpoint: String,
    /// Bearer token.  `None` (or empty) sends no `Authorization` header.
    pub api_key: Option<String>,
    /// Model identifier sent in every request body.
    pub model: String,
    /// Fixed system instruction placed before the transcript.
    pub system_prompt: String,
    /// Value of the `HTTP-Referer` attribution header.
    pub referer: String,
    /// Value of the `X-Title` attribution header.
    pub title: String,
    /// Optional host-level request timeout.  The core enforces none.
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".into(),
            api_key: None,
            model: "deepseek/deepseek-chat:free".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            referer: "https://marathibatmya.in/".into(),
            title: "Prashant".into(),
            timeout_secs: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings handed to the platform speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Whether the microphone input channel is offered at all.
    pub enabled: bool,
    /// BCP-47 language tag the recognizer is configured for.
    pub language: String,
    /// Keep listening across pauses until explicitly stopped.
    pub continuous: bool,
    /// Forward partial results.  Always `false` for conversation input.
    pub interim_results: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "hi-IN".into(),
            continuous: true,
            interim_results: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PersistenceConfig
// ---------------------------------------------------------------------------

/// Best-effort transcript persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Rehydrate at startup and write after every append.
    pub enabled: bool,
    /// Override for the transcript file; defaults to
    /// [`AppPaths::transcript_file`].
    pub transcript_file: Option<PathBuf>,
}

impl PersistenceConfig {
    /// The file the transcript is stored in.
    pub fn resolve_path(&self, paths: &AppPaths) -> PathBuf {
        self.transcript_file
            .clone()
            .unwrap_or_else(|| paths.transcript_file.clone())
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use persona_chat::config::AppConfig;
///
/// // Load (returns Default when file is missing), then pick up the token.
/// let config = AppConfig::load().unwrap().with_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Completion endpoint settings.
    pub completion: CompletionConfig,
    /// Speech input settings.
    pub speech: SpeechConfig,
    /// Transcript persistence settings.
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill `completion.api_key` from [`API_KEY_ENV`] when it is set.
    pub fn with_env_overrides(self) -> Self {
        self.with_api_key_from(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_from(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.completion.api_key = Some(key);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
