//! Diagnostic logging through `tracing`.
//!
//! The terminal UI owns the screen, so interactive sessions only log when a
//! file is given. One-shot commands log warnings to stderr instead.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILE_DIRECTIVE: &str = "hilos=info";
const DEFAULT_STDERR_DIRECTIVE: &str = "warn";

/// Where diagnostic output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Off,
}

impl<'a> LogTarget<'a> {
    pub fn choose(log_file: Option<&'a Path>, interactive: bool) -> Self {
        match (log_file, interactive) {
            (Some(path), _) => LogTarget::File(path),
            (None, true) => LogTarget::Off,
            (None, false) => LogTarget::Stderr,
        }
    }
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into())
}

/// Installs the global subscriber. `RUST_LOG` overrides the default levels.
pub fn init_tracing(target: LogTarget<'_>) -> Result<(), std::io::Error> {
    match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(env_filter(DEFAULT_FILE_DIRECTIVE))
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter(DEFAULT_STDERR_DIRECTIVE))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        LogTarget::Off => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_sessions_stay_quiet_without_a_file() {
        assert_eq!(LogTarget::choose(None, true), LogTarget::Off);
        assert_eq!(LogTarget::choose(None, false), LogTarget::Stderr);

        let path = Path::new("/tmp/hilos.log");
        assert_eq!(LogTarget::choose(Some(path), true), LogTarget::File(path));
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("hilos.log");
        assert!(init_tracing(LogTarget::File(&missing)).is_err());
    }
}
