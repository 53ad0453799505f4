mod chats;
mod input;
mod streaming;

use tokio::sync::mpsc;

use super::App;
use crate::core::engine::{CompletionChunk, InitProgress};
use crate::core::message::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    EngineProgress {
        report: InitProgress,
    },
    EngineInitialized,
    EngineFailed {
        message: String,
    },
    SubmitMessage {
        message: String,
    },
    AppendResponseChunk {
        chunk: CompletionChunk,
        stream_id: u64,
    },
    StreamErrored {
        message: String,
        stream_id: u64,
    },
    StreamCompleted {
        stream_id: u64,
    },
    NewChat,
    FocusChatList,
    ChatListMoveUp,
    ChatListMoveDown,
    OpenSelectedChat,
    BeginRename,
    CompleteRename {
        new_name: String,
    },
    BeginDelete,
    ConfirmDelete,
    CancelMode,
    ClearStatus,
    ScrollPageUp,
    ScrollPageDown,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

impl AppActionContext {
    /// Lines moved by one PageUp/PageDown.
    pub fn page_lines(&self) -> u16 {
        self.term_height.saturating_sub(6).max(1)
    }
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    /// Queues actions in order. Returns `false` once the event loop is gone.
    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext) -> bool
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            if self
                .tx
                .send(AppActionEnvelope {
                    action,
                    context: ctx,
                })
                .is_err()
            {
                return false;
            }
        }
        true
    }
}

/// Work the reducer asks the event loop to start.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SpawnExchange {
        messages: Vec<Message>,
        stream_id: u64,
    },
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    match action {
        AppAction::EngineProgress { .. }
        | AppAction::EngineInitialized
        | AppAction::EngineFailed { .. }
        | AppAction::SubmitMessage { .. }
        | AppAction::AppendResponseChunk { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. } => streaming::handle_streaming_action(app, action),

        AppAction::NewChat
        | AppAction::FocusChatList
        | AppAction::ChatListMoveUp
        | AppAction::ChatListMoveDown
        | AppAction::OpenSelectedChat
        | AppAction::BeginRename
        | AppAction::CompleteRename { .. }
        | AppAction::BeginDelete
        | AppAction::ConfirmDelete => chats::handle_chat_action(app, action),

        AppAction::CancelMode
        | AppAction::ClearStatus
        | AppAction::ScrollPageUp
        | AppAction::ScrollPageDown
        | AppAction::Quit => input::handle_input_action(app, action, ctx),
    }
}
