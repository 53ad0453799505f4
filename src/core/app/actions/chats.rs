use tracing::warn;

use super::{App, AppAction, AppCommand};
use crate::core::app::ui_state::UiMode;
use crate::core::app::{EMPTY_LIST_GREETING, NEW_CHAT_GREETING};
use crate::core::chat_id::ChatId;
use crate::core::manager::DeleteOutcome;
use crate::core::message::Notice;
use crate::core::records::RecordError;

pub(super) fn handle_chat_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::NewChat => {
            app.ui.back_to_typing();
            match app.chats.new_chat() {
                Ok(_) => {
                    app.on_chat_shown();
                    app.greet(NEW_CHAT_GREETING);
                }
                Err(err) => report_storage_error(app, "start a new chat", &err),
            }
        }
        AppAction::FocusChatList => {
            let entries = app.chats.entries();
            if entries.is_empty() {
                app.ui.set_status(Notice::info("No saved chats yet"));
            } else {
                let cursor = entries
                    .iter()
                    .position(|entry| entry.active)
                    .unwrap_or(entries.len() - 1);
                app.ui.enter_chat_list(cursor);
            }
        }
        AppAction::ChatListMoveUp => move_cursor(app, -1),
        AppAction::ChatListMoveDown => move_cursor(app, 1),
        AppAction::OpenSelectedChat => {
            if let Some(id) = selected_chat(app) {
                app.ui.back_to_typing();
                if &id != app.chats.active_id() {
                    match app.chats.switch_to(id) {
                        Ok(()) => app.on_chat_shown(),
                        Err(err) => report_storage_error(app, "open chat", &err),
                    }
                }
            }
        }
        AppAction::BeginRename => {
            if let Some(id) = selected_chat(app) {
                let current = app.chats.custom_name(&id).unwrap_or_default().to_string();
                app.ui.enter_rename(id, &current);
            }
        }
        AppAction::CompleteRename { new_name } => complete_rename(app, &new_name),
        AppAction::BeginDelete => {
            if let Some(id) = selected_chat(app) {
                if app.is_streaming_into(&id) {
                    app.ui.set_status(Notice::warning(
                        "Wait for the reply to finish before deleting this chat",
                    ));
                } else {
                    app.ui.mode = UiMode::ConfirmDelete { id };
                }
            }
        }
        AppAction::ConfirmDelete => {
            if let UiMode::ConfirmDelete { id } = &app.ui.mode {
                let id = id.clone();
                delete_chat(app, &id);
            }
        }
        _ => {}
    }
    None
}

fn selected_chat(app: &App) -> Option<ChatId> {
    let cursor = app.ui.chat_list_cursor()?;
    app.chats.entries().get(cursor).map(|entry| entry.id.clone())
}

fn move_cursor(app: &mut App, delta: isize) {
    let len = app.chats.entries().len();
    if let UiMode::ChatList { cursor } = &mut app.ui.mode {
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }
}

fn complete_rename(app: &mut App, new_name: &str) {
    let UiMode::Rename { id, .. } = &app.ui.mode else {
        return;
    };
    let id = id.clone();
    let cursor = app
        .chats
        .entries()
        .iter()
        .position(|entry| entry.id == id)
        .unwrap_or(0);

    match app.chats.rename(&id, new_name) {
        Ok(true) => app.ui.set_status(Notice::info(format!(
            "Renamed to {}",
            app.chats.display_name(&id)
        ))),
        Ok(false) => {}
        Err(err) => report_storage_error(app, "rename chat", &err),
    }
    app.ui.enter_chat_list(cursor);
}

fn delete_chat(app: &mut App, id: &ChatId) {
    if app.is_streaming_into(id) {
        app.ui.back_to_typing();
        return;
    }

    let name = app.chats.display_name(id);
    match app.chats.delete(id) {
        Ok(DeleteOutcome::Removed) => {
            app.ui.set_status(Notice::info(format!("Deleted {name}")));
        }
        Ok(DeleteOutcome::SwitchedTo(_)) => {
            app.on_chat_shown();
            app.ui.set_status(Notice::info(format!("Deleted {name}")));
        }
        Ok(DeleteOutcome::StartedFresh(_)) => {
            app.on_chat_shown();
            app.greet(EMPTY_LIST_GREETING);
            app.ui.set_status(Notice::info(format!("Deleted {name}")));
        }
        Err(err) => report_storage_error(app, "delete chat", &err),
    }

    let remaining = app.chats.entries().len();
    if remaining == 0 {
        app.ui.back_to_typing();
    } else {
        let cursor = app
            .chats
            .entries()
            .iter()
            .position(|entry| entry.active)
            .unwrap_or(remaining - 1);
        app.ui.enter_chat_list(cursor);
    }
}

fn report_storage_error(app: &mut App, what: &str, err: &RecordError) {
    warn!(error = %err, "failed to {what}");
    app.ui
        .set_status(Notice::error(format!("Could not {what}: {err}")));
}
