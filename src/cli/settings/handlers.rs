//! Data-driven handlers for the three shapes of setting: free text, on/off,
//! and a number of seconds.

use std::path::PathBuf;

use super::error::SettingError;
use super::helpers::{format_bool, mask_secret, parse_bool, parse_seconds, success_set};
use super::SettingHandler;
use crate::core::config::data::{path_display, Config, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::utils::url::validate_base_url;

/// Handler for text settings, optionally validated and optionally secret.
pub struct TextHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    secret: bool,
    validate: fn(&str) -> Result<String, SettingError>,
    get: fn(&Config) -> Option<String>,
    set_field: fn(&mut Config, Option<String>),
}

impl TextHandler {
    fn display(&self, value: &str) -> String {
        if self.secret {
            mask_secret(value)
        } else {
            value.to_string()
        }
    }
}

impl SettingHandler for TextHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let input = args.join(" ");
        if input.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let value = (self.validate)(input.trim())?;
        let message = success_set(self.key, &self.display(&value));
        (self.set_field)(config, Some(value));
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, self.display(&value)),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

/// Handler for on/off settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default: bool,
    get: fn(&Config) -> Option<bool>,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        (self.set_field)(config, Some(value));
        Ok(success_set(self.key, format_bool(value)))
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key,
            format_bool(self.default)
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, format_bool(value)),
            None => format!(
                "  {}: (unset, default: {})",
                self.key,
                format_bool(self.default)
            ),
        }
    }
}

/// Handler for `stream-idle-timeout`. Zero turns the timeout off.
pub struct IdleTimeoutHandler;

impl SettingHandler for IdleTimeoutHandler {
    fn key(&self) -> &'static str {
        "stream-idle-timeout"
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set the reply idle timeout, give a number of seconds:",
                example: "hilos set stream-idle-timeout 60",
            });
        };

        let secs = parse_seconds(input)?;
        config.stream_idle_timeout_secs = Some(secs);
        if secs == 0 {
            Ok("✅ Set stream-idle-timeout to: off".to_string())
        } else {
            Ok(success_set(self.key(), &format!("{secs}s")))
        }
    }

    fn unset(&self, config: &mut Config) -> String {
        config.stream_idle_timeout_secs = None;
        "✅ Unset stream-idle-timeout (will use default: off)".to_string()
    }

    fn format(&self, config: &Config) -> String {
        match config.stream_idle_timeout_secs {
            Some(secs) if secs > 0 => format!("  {}: {secs}s", self.key()),
            Some(_) => format!("  {}: off", self.key()),
            None => format!("  {}: (unset, default: off)", self.key()),
        }
    }
}

fn accept_text(input: &str) -> Result<String, SettingError> {
    Ok(input.to_string())
}

fn accept_base_url(input: &str) -> Result<String, SettingError> {
    validate_base_url(input).map_err(SettingError::InvalidUrl)
}

pub fn base_url_handler() -> TextHandler {
    TextHandler {
        key: "base-url",
        hint: "To set the engine address, give its OpenAI-compatible base URL:",
        example: "hilos set base-url http://localhost:11434/v1",
        default_display: DEFAULT_BASE_URL,
        secret: false,
        validate: accept_base_url,
        get: |c| c.base_url.clone(),
        set_field: |c, v| c.base_url = v,
    }
}

pub fn model_handler() -> TextHandler {
    TextHandler {
        key: "model",
        hint: "To set the default model, give its name as the engine lists it:",
        example: "hilos set model llama3.2:3b",
        default_display: DEFAULT_MODEL,
        secret: false,
        validate: accept_text,
        get: |c| c.model.clone(),
        set_field: |c, v| c.model = v,
    }
}

pub fn api_key_handler() -> TextHandler {
    TextHandler {
        key: "api-key",
        hint: "To send a bearer token with every request, give the key:",
        example: "hilos set api-key sk-local-123",
        default_display: "none",
        secret: true,
        validate: accept_text,
        get: |c| c.api_key.clone(),
        set_field: |c, v| c.api_key = v,
    }
}

pub fn data_dir_handler() -> TextHandler {
    TextHandler {
        key: "data-dir",
        hint: "To keep chats somewhere else, give a directory:",
        example: "hilos set data-dir ~/Documents/chats",
        default_display: "platform data directory",
        secret: false,
        validate: accept_text,
        get: |c| c.data_dir.as_ref().map(path_display),
        set_field: |c, v| c.data_dir = v.map(PathBuf::from),
    }
}

pub fn resume_last_handler() -> BooleanHandler {
    BooleanHandler {
        key: "resume-last",
        hint: "To reopen the latest chat at start-up, specify on or off:",
        example: "hilos set resume-last on",
        default: false,
        get: |c| c.resume_last,
        set_field: |c, v| c.resume_last = v,
    }
}

pub fn greeting_handler() -> BooleanHandler {
    BooleanHandler {
        key: "greeting",
        hint: "To show or hide greetings in new chats, specify on or off:",
        example: "hilos set greeting off",
        default: true,
        get: |c| c.greeting,
        set_field: |c, v| c.greeting = v,
    }
}
