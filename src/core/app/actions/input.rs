use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::ui_state::UiMode;

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::CancelMode => {
            app.ui.mode = match std::mem::replace(&mut app.ui.mode, UiMode::Typing) {
                UiMode::Rename { id, .. } | UiMode::ConfirmDelete { id } => {
                    let cursor = app
                        .chats
                        .entries()
                        .iter()
                        .position(|entry| entry.id == id)
                        .unwrap_or(0);
                    UiMode::ChatList { cursor }
                }
                UiMode::ChatList { .. } | UiMode::Typing => UiMode::Typing,
            };
        }
        AppAction::ClearStatus => app.ui.clear_status(),
        AppAction::ScrollPageUp => app.ui.scroll_up(ctx.page_lines()),
        AppAction::ScrollPageDown => app.ui.scroll_down(ctx.page_lines()),
        AppAction::Quit => app.ui.exit_requested = true,
        _ => {}
    }
    None
}
