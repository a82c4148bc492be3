//! Where persona-chat keeps its files.
//!
//! | File              | Location                                  |
//! |-------------------|-------------------------------------------|
//! | `settings.toml`   | `dirs::config_dir()/persona-chat/`        |
//! | `transcript.json` | `dirs::data_local_dir()/persona-chat/`    |
//!
//! On Linux these are `~/.config/persona-chat/` and
//! `~/.local/share/persona-chat/`; on macOS both land in
//! `~/Library/Application Support/persona-chat/`.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "persona-chat";
const SETTINGS_FILE: &str = "settings.toml";
const TRANSCRIPT_FILE: &str = "transcript.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    /// Default target of [`JsonFileStorage`](crate::transcript::JsonFileStorage).
    pub transcript_file: PathBuf,
}

impl AppPaths {
    /// Platform locations.  A platform without a config or data directory
    /// falls back to `./persona-chat/`.
    pub fn new() -> Self {
        let config_dir = platform_dir(dirs::config_dir());
        let data_dir = platform_dir(dirs::data_local_dir());
        Self::from_dirs(config_dir, data_dir)
    }

    /// Every file under a single `root` directory (portable installs, tests).
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self::from_dirs(root.clone(), root)
    }

    fn from_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            transcript_file: data_dir.join(TRANSCRIPT_FILE),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn platform_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}
