use std::path::PathBuf;
use std::time::Duration;

use crate::core::config::data::{Config, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::config::io::{project_dirs, ConfigError};

/// Values given on the command line for this run only.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Every setting with its fallback applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
    pub resume_last: bool,
    pub greeting: bool,
    pub stream_idle_timeout: Option<Duration>,
}

pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().join("chats"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Applies, in order: command-line overrides, this file, `HILOS_*`
    /// environment variables, built-in defaults.
    pub fn resolve(&self, overrides: &ConfigOverrides) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with_env(overrides, |name| std::env::var(name).ok())
    }

    pub(crate) fn resolve_with_env<F>(
        &self,
        overrides: &ConfigOverrides,
        env: F,
    ) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = non_empty(overrides.base_url.clone())
            .or_else(|| non_empty(self.base_url.clone()))
            .or_else(|| non_empty(env("HILOS_BASE_URL")))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_empty(overrides.model.clone())
            .or_else(|| non_empty(self.model.clone()))
            .or_else(|| non_empty(env("HILOS_MODEL")))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_key = non_empty(self.api_key.clone()).or_else(|| non_empty(env("HILOS_API_KEY")));

        let data_dir = match overrides.data_dir.clone().or_else(|| self.data_dir.clone()) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        Ok(ResolvedConfig {
            base_url,
            model,
            api_key,
            data_dir,
            resume_last: self.resume_last.unwrap_or(false),
            greeting: self.greeting.unwrap_or(true),
            stream_idle_timeout: self
                .stream_idle_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}
