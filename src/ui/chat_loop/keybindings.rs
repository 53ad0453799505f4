//! Mode-aware key mapping. Keys either become [`AppAction`]s for the reducer or
//! edit one of the text areas in place.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input;

use crate::core::app::{App, AppAction, UiMode};

#[derive(Debug, PartialEq)]
pub enum KeyResult {
    Actions(Vec<AppAction>),
    /// A text area was edited; only a redraw is needed.
    Edited,
    Ignored,
}

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyResult {
    if is_ctrl(&key, 'c') {
        return KeyResult::Actions(vec![AppAction::Quit]);
    }

    match key.code {
        KeyCode::PageUp => return KeyResult::Actions(vec![AppAction::ScrollPageUp]),
        KeyCode::PageDown => return KeyResult::Actions(vec![AppAction::ScrollPageDown]),
        _ => {}
    }

    if app.ui.is_typing() {
        return handle_typing_key(app, key);
    }

    match &mut app.ui.mode {
        UiMode::Typing => KeyResult::Ignored,
        UiMode::ChatList { .. } => handle_chat_list_key(key),
        UiMode::Rename { input, .. } => match key.code {
            KeyCode::Enter => KeyResult::Actions(vec![AppAction::CompleteRename {
                new_name: input.lines().join(" "),
            }]),
            KeyCode::Esc => KeyResult::Actions(vec![AppAction::CancelMode]),
            _ => {
                input.input(Input::from(key));
                KeyResult::Edited
            }
        },
        UiMode::ConfirmDelete { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                KeyResult::Actions(vec![AppAction::ConfirmDelete])
            }
            _ => KeyResult::Actions(vec![AppAction::CancelMode]),
        },
    }
}

fn handle_typing_key(app: &mut App, key: KeyEvent) -> KeyResult {
    if is_ctrl(&key, 'n') {
        return KeyResult::Actions(vec![AppAction::NewChat]);
    }

    match key.code {
        KeyCode::Tab => KeyResult::Actions(vec![AppAction::FocusChatList]),
        KeyCode::Esc => KeyResult::Actions(vec![AppAction::ClearStatus]),
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            app.ui.textarea.insert_newline();
            KeyResult::Edited
        }
        KeyCode::Enter => {
            // The typed text stays put while input is disabled.
            if !app.input_enabled() {
                return KeyResult::Ignored;
            }
            let message = app.ui.take_input();
            KeyResult::Actions(vec![AppAction::SubmitMessage { message }])
        }
        _ => {
            if app.ui.textarea.input(Input::from(key)) {
                KeyResult::Edited
            } else {
                KeyResult::Ignored
            }
        }
    }
}

fn handle_chat_list_key(key: KeyEvent) -> KeyResult {
    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => AppAction::ChatListMoveUp,
        KeyCode::Down | KeyCode::Char('j') => AppAction::ChatListMoveDown,
        KeyCode::Enter => AppAction::OpenSelectedChat,
        KeyCode::Char('r') => AppAction::BeginRename,
        KeyCode::Char('d') => AppAction::BeginDelete,
        KeyCode::Char('n') => AppAction::NewChat,
        KeyCode::Esc | KeyCode::Tab => AppAction::CancelMode,
        _ => return KeyResult::Ignored,
    };
    KeyResult::Actions(vec![action])
}
