use tui_textarea::{CursorMove, TextArea};

use crate::core::chat_id::ChatId;
use crate::core::engine::InitProgress;
use crate::core::message::Notice;

/// What keyboard input currently drives.
#[derive(Debug)]
pub enum UiMode {
    Typing,
    /// The chat list has focus; `cursor` indexes the listed entries.
    ChatList { cursor: usize },
    Rename {
        id: ChatId,
        input: TextArea<'static>,
    },
    ConfirmDelete { id: ChatId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    Loading { progress: f32, text: String },
    Ready,
    Failed(String),
}

impl EngineStatus {
    pub fn loading() -> Self {
        EngineStatus::Loading {
            progress: 0.0,
            text: "Starting engine…".to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }

    /// Records a progress report. Returns `true` exactly once, when the
    /// report is the first to signal readiness.
    pub fn record(&mut self, report: InitProgress) -> bool {
        match self {
            EngineStatus::Loading { .. } if report.is_ready() => {
                *self = EngineStatus::Ready;
                true
            }
            EngineStatus::Loading { .. } => {
                *self = EngineStatus::Loading {
                    progress: report.progress,
                    text: report.text,
                };
                false
            }
            EngineStatus::Ready | EngineStatus::Failed(_) => false,
        }
    }
}

/// A notice shown after the first `after` messages of the active chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedNotice {
    pub after: usize,
    pub notice: Notice,
}

pub struct UiState {
    pub textarea: TextArea<'static>,
    pub mode: UiMode,
    pub status: Option<Notice>,
    pub notices: Vec<PlacedNotice>,
    /// Transcript lines scrolled up from the bottom. Zero follows new output.
    pub scroll_from_bottom: u16,
    pub exit_requested: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        let mut ui = Self {
            textarea: TextArea::default(),
            mode: UiMode::Typing,
            status: None,
            notices: Vec::new(),
            scroll_from_bottom: 0,
            exit_requested: false,
        };
        ui.configure_textarea();
        ui
    }

    fn configure_textarea(&mut self) {
        self.textarea
            .set_cursor_line_style(ratatui::style::Style::default());
        self.textarea.set_placeholder_text("Type a message…");
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn clear_input(&mut self) {
        self.textarea = TextArea::default();
        self.configure_textarea();
    }

    /// Removes and returns the typed text.
    pub fn take_input(&mut self) -> String {
        let text = self.input_text();
        self.clear_input();
        text
    }

    pub fn set_status(&mut self, notice: Notice) {
        self.status = Some(notice);
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn add_notice(&mut self, after: usize, notice: Notice) {
        self.notices.push(PlacedNotice { after, notice });
    }

    /// Forgets transcript-only notices, e.g. when another chat is shown.
    pub fn clear_notices(&mut self) {
        self.notices.clear();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.mode, UiMode::Typing)
    }

    pub fn enter_chat_list(&mut self, cursor: usize) {
        self.mode = UiMode::ChatList { cursor };
    }

    /// Opens the rename prompt prefilled with `current`.
    pub fn enter_rename(&mut self, id: ChatId, current: &str) {
        let mut input = TextArea::from(vec![current.to_string()]);
        input.move_cursor(CursorMove::End);
        input.set_cursor_line_style(ratatui::style::Style::default());
        self.mode = UiMode::Rename { id, input };
    }

    pub fn rename_text(&self) -> Option<String> {
        match &self.mode {
            UiMode::Rename { input, .. } => Some(input.lines().join(" ")),
            _ => None,
        }
    }

    pub fn chat_list_cursor(&self) -> Option<usize> {
        match self.mode {
            UiMode::ChatList { cursor } => Some(cursor),
            _ => None,
        }
    }

    pub fn back_to_typing(&mut self) {
        self.mode = UiMode::Typing;
    }
}
