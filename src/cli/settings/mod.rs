//! Settings management for the `set` and `unset` commands.
//!
//! Each key is served by a [`SettingHandler`] that edits a [`Config`] in
//! memory; [`apply_set`] and [`apply_unset`] load the file, run the handler and
//! write the result back.

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

use std::path::Path;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::data::Config;

pub trait SettingHandler: Send + Sync {
    fn key(&self) -> &'static str;

    /// Stores the value given in `args`. Returns the message to display.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    /// Clears the value so the default applies again.
    fn unset(&self, config: &mut Config) -> String;

    /// One line for the `hilos set` listing.
    fn format(&self, config: &Config) -> String;
}

/// Current value of every setting, in display order.
pub fn format_all(registry: &SettingRegistry, config: &Config) -> Vec<String> {
    registry
        .keys_display_order()
        .iter()
        .filter_map(|key| registry.get(key))
        .map(|handler| handler.format(config))
        .collect()
}

fn load(config_path: &Path) -> Result<Config, SettingError> {
    Config::load_from_path(config_path).map_err(|e| SettingError::ConfigError(e.to_string()))
}

fn store(config: &Config, config_path: &Path) -> Result<(), SettingError> {
    config
        .save_to_path(config_path)
        .map_err(|e| SettingError::ConfigError(e.to_string()))
}

pub fn apply_set(config_path: &Path, key: &str, args: &[String]) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    let mut config = load(config_path)?;
    let message = handler.set(args, &mut config)?;
    store(&config, config_path)?;
    Ok(message)
}

pub fn apply_unset(config_path: &Path, key: &str) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;

    let mut config = load(config_path)?;
    let message = handler.unset(&mut config);
    store(&config, config_path)?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn set_and_unset_round_trip_through_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let message = apply_set(&path, "model", &args(&["llama3.2:3b"])).unwrap();
        assert_eq!(message, "✅ Set model to: llama3.2:3b");
        apply_set(&path, "greeting", &args(&["off"])).unwrap();
        apply_set(&path, "data_dir", &args(&["/srv/chats"])).unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.model.as_deref(), Some("llama3.2:3b"));
        assert_eq!(config.greeting, Some(false));
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/chats")));

        apply_unset(&path, "model").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.model, None);
        assert_eq!(config.greeting, Some(false));
    }

    #[test]
    fn invalid_values_leave_the_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        assert_eq!(
            apply_set(&path, "resume-last", &args(&["sometimes"])),
            Err(SettingError::InvalidBoolean("sometimes".to_string()))
        );
        assert!(matches!(
            apply_set(&path, "base-url", &args(&["ftp://example.org"])),
            Err(SettingError::InvalidUrl(_))
        ));
        assert!(matches!(
            apply_set(&path, "model", &[]),
            Err(SettingError::MissingArgs { .. })
        ));
        assert_eq!(
            apply_unset(&path, "theme"),
            Err(SettingError::UnknownKey("theme".to_string()))
        );
        assert!(!path.exists());
    }

    #[test]
    fn base_url_is_normalized_before_saving() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        apply_set(&path, "base-url", &args(&["http://127.0.0.1:8080/v1/"])).unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:8080/v1"));
    }

    #[test]
    fn listing_masks_the_api_key_and_shows_defaults() {
        let config = Config {
            api_key: Some("sk-local-9876".to_string()),
            stream_idle_timeout_secs: Some(45),
            ..Config::default()
        };
        let lines = format_all(&SettingRegistry::new(), &config);

        assert_eq!(lines.len(), 7);
        assert!(lines.contains(&"  api-key: ****9876".to_string()));
        assert!(lines.contains(&"  stream-idle-timeout: 45s".to_string()));
        assert!(lines.contains(&"  greeting: (unset, default: on)".to_string()));
        assert!(lines
            .iter()
            .any(|line| line.starts_with("  model: (unset, default: ")));
    }
}
