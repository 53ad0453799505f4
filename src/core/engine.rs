//! The language-model engine as seen by the rest of the client.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::core::message::Message;

/// Initialization report. `progress` runs from 0.0 to 1.0; 1.0 means ready.
#[derive(Debug, Clone, PartialEq)]
pub struct InitProgress {
    pub progress: f32,
    pub text: String,
}

impl InitProgress {
    pub fn new(progress: f32, text: impl Into<String>) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            text: text.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.progress >= 1.0
    }
}

/// One increment of a streamed reply. `delta_content` is absent for chunks
/// that carry no text (role headers, finish markers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionChunk {
    pub delta_content: Option<String>,
}

impl CompletionChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            delta_content: Some(content.into()),
        }
    }

    /// The incremental text, empty when the chunk has none.
    pub fn delta(&self) -> &str {
        self.delta_content.as_deref().unwrap_or("")
    }
}

/// Reply chunks in the order the engine produced them.
pub type CompletionStream = BoxStream<'static, Result<CompletionChunk, EngineError>>;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine could not be reached or the connection broke.
    Request(String),
    /// The engine answered with an error payload.
    Api(String),
    /// No chunk arrived within the configured idle window.
    Timeout(Duration),
    /// The configured model is not served by the engine.
    ModelUnavailable {
        model: String,
        available: Vec<String>,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Request(message) => write!(f, "Request failed: {message}"),
            EngineError::Api(message) => write!(f, "{message}"),
            EngineError::Timeout(after) => {
                write!(f, "No response from the engine for {}s", after.as_secs())
            }
            EngineError::ModelUnavailable { model, available } => {
                write!(f, "Model '{model}' is not available")?;
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

impl StdError for EngineError {}

#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Prepares the engine, reporting progress as it goes. Succeeds only after
    /// a report with `progress == 1.0`.
    async fn initialize(
        &self,
        on_progress: &(dyn Fn(InitProgress) + Send + Sync),
    ) -> Result<(), EngineError>;

    /// Starts a streamed reply to the conversation so far.
    async fn create_completion(
        &self,
        messages: Vec<Message>,
    ) -> Result<CompletionStream, EngineError>;
}
