//! Parsing and formatting shared by the setting handlers.

use super::error::SettingError;

/// Parse a boolean value from user input.
///
/// Accepts: on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn parse_seconds(input: &str) -> Result<u64, SettingError> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|_| SettingError::InvalidNumber(input.to_string()))
}

pub fn success_set(key: &str, display: &str) -> String {
    format!("✅ Set {key} to: {display}")
}

/// Hides all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
