use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_MODEL: &str = "gemma2:2b";

/// Settings persisted in `config.toml`. Unset fields fall back to the
/// environment and then to built-in defaults, see `Config::resolve`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the OpenAI-compatible API (e.g. Ollama's `/v1`)
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Directory holding one JSON file per chat plus the names record
    pub data_dir: Option<PathBuf>,
    /// Reopen the most recent chat at start-up instead of a fresh one
    pub resume_last: Option<bool>,
    /// Show greeting notices in the transcript
    pub greeting: Option<bool>,
    /// Fail a reply when the engine stays silent this long
    pub stream_idle_timeout_secs: Option<u64>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.local/share/hilos/chats` → `~/.local/share/hilos/chats`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
