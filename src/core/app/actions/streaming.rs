use tracing::{debug, info, warn};

use super::{App, AppAction, AppCommand};
use crate::core::app::{EngineStatus, READY_GREETING};
use crate::core::message::Notice;

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::EngineProgress { report } => {
            if app.engine.record(report) {
                mark_engine_ready(app);
            }
            None
        }
        AppAction::EngineInitialized => {
            // Engines that never report 1.0 are ready once initialize returns.
            if matches!(app.engine, EngineStatus::Loading { .. }) {
                app.engine = EngineStatus::Ready;
                mark_engine_ready(app);
            }
            None
        }
        AppAction::EngineFailed { message } => {
            warn!(error = %message, "engine failed to initialize");
            app.engine = EngineStatus::Failed(message);
            None
        }
        AppAction::SubmitMessage { message } => submit_message(app, message),
        AppAction::AppendResponseChunk { chunk, stream_id } => {
            if app.exchange.push_chunk(stream_id, &chunk).is_some()
                && app.visible_pending_reply().is_some()
            {
                app.ui.scroll_to_bottom();
            }
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            finalize_stream(app, stream_id);
            None
        }
        AppAction::StreamErrored { message, stream_id } => {
            if app.exchange.fail(stream_id) {
                warn!(stream_id, error = %message, "reply failed");
                app.ui.set_status(Notice::error(message.trim()));
            }
            None
        }
        _ => None,
    }
}

fn mark_engine_ready(app: &mut App) {
    info!(model = %app.settings.model, "engine ready");
    app.greet(READY_GREETING);
    app.ui.scroll_to_bottom();
}

fn submit_message(app: &mut App, message: String) -> Option<AppCommand> {
    if !app.input_enabled() {
        return None;
    }

    let text = message.trim().to_string();
    let origin = app.chats.active_id().clone();
    let stream_id = app.exchange.begin(origin.clone())?;
    debug!(chat = %origin, stream_id, "submitting message");

    app.chats.append_user(text);
    match app.chats.save() {
        Ok(()) => app.ui.clear_status(),
        Err(err) => {
            warn!(chat = %origin, error = %err, "could not save chat before sending");
            app.ui
                .set_status(Notice::error(format!("Could not save chat: {err}")));
        }
    }
    app.ui.scroll_to_bottom();

    Some(AppCommand::SpawnExchange {
        messages: app.chats.messages().to_vec(),
        stream_id,
    })
}

fn finalize_stream(app: &mut App, stream_id: u64) {
    let Some((origin, reply)) = app.exchange.complete(stream_id) else {
        return;
    };
    debug!(chat = %origin, stream_id, chars = reply.len(), "reply complete");

    if let Err(err) = app.chats.append_reply(&origin, reply) {
        warn!(chat = %origin, error = %err, "could not save reply");
        app.ui
            .set_status(Notice::error(format!("Could not save reply: {err}")));
    }
    if &origin == app.chats.active_id() {
        app.ui.scroll_to_bottom();
    }
}
