//! Application state for the interactive client and the reducer that mutates
//! it. The event loop owns the [`App`]; background tasks only ever talk to it
//! through [`AppAction`]s.

pub mod actions;
pub mod ui_state;


pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use ui_state::{EngineStatus, PlacedNotice, UiMode, UiState};

use crate::core::chat_id::ChatId;
use crate::core::exchange::ReplyCoordinator;
use crate::core::manager::SessionManager;
use crate::core::message::Notice;

pub const READY_GREETING: &str =
    "Hi! I'm a chatbot running entirely on your machine. How can I help you today?";
pub const NEW_CHAT_GREETING: &str = "Hi! This is a new chat. How can I help?";
pub const EMPTY_LIST_GREETING: &str = "No chats left. This is a new chat.";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub model: String,
    pub greeting: bool,
}

pub struct App {
    pub chats: SessionManager,
    pub exchange: ReplyCoordinator,
    pub engine: EngineStatus,
    pub ui: UiState,
    pub settings: AppSettings,
}

impl App {
    pub fn new(chats: SessionManager, settings: AppSettings) -> Self {
        Self {
            chats,
            exchange: ReplyCoordinator::new(),
            engine: EngineStatus::loading(),
            ui: UiState::new(),
            settings,
        }
    }

    /// Input is accepted only once the engine is ready and no exchange is
    /// outstanding.
    pub fn input_enabled(&self) -> bool {
        self.engine.is_ready() && self.exchange.can_submit()
    }

    /// The in-flight reply, when it belongs to the chat on screen.
    pub fn visible_pending_reply(&self) -> Option<&str> {
        match self.exchange.origin() {
            Some(origin) if origin == self.chats.active_id() => Some(self.exchange.reply()),
            _ => None,
        }
    }

    /// Whether `id` has an exchange in flight.
    pub fn is_streaming_into(&self, id: &ChatId) -> bool {
        self.exchange.origin() == Some(id)
    }

    pub(crate) fn greet(&mut self, text: &str) {
        if self.settings.greeting {
            let after = self.chats.messages().len();
            self.ui.add_notice(after, Notice::info(text));
        }
    }

    /// Called after the active chat changed: notices of the previous chat go
    /// away and the transcript follows the bottom again.
    pub(crate) fn on_chat_shown(&mut self) {
        self.ui.clear_notices();
        self.ui.scroll_to_bottom();
    }
}
