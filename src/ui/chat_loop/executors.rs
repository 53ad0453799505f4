//! Background tasks. They never touch the [`App`](crate::core::app::App);
//! everything they learn is reported back as actions.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::app::{AppAction, AppActionContext, AppActionDispatcher};
use crate::core::engine::{ChatEngine, InitProgress};
use crate::core::message::Message;

pub fn spawn_engine_initializer(
    engine: Arc<dyn ChatEngine>,
    dispatcher: AppActionDispatcher,
) -> JoinHandle<()> {
    tokio::spawn(async move { initialize_engine(engine.as_ref(), &dispatcher).await })
}

pub async fn initialize_engine(engine: &dyn ChatEngine, dispatcher: &AppActionDispatcher) {
    let ctx = AppActionContext::default();
    let progress_dispatcher = dispatcher.clone();
    let on_progress = move |report: InitProgress| {
        progress_dispatcher.dispatch_many([AppAction::EngineProgress { report }], ctx);
    };

    let action = match engine.initialize(&on_progress).await {
        Ok(()) => AppAction::EngineInitialized,
        Err(err) => AppAction::EngineFailed {
            message: err.to_string(),
        },
    };
    dispatcher.dispatch_many([action], ctx);
}

pub fn spawn_exchange(
    engine: Arc<dyn ChatEngine>,
    dispatcher: AppActionDispatcher,
    messages: Vec<Message>,
    stream_id: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move { run_exchange(engine.as_ref(), &dispatcher, messages, stream_id).await })
}

/// Streams one reply, forwarding chunks in the order the engine produced them
/// and finishing with exactly one completion or error action.
pub async fn run_exchange(
    engine: &dyn ChatEngine,
    dispatcher: &AppActionDispatcher,
    messages: Vec<Message>,
    stream_id: u64,
) {
    let ctx = AppActionContext::default();
    let mut stream = match engine.create_completion(messages).await {
        Ok(stream) => stream,
        Err(err) => {
            dispatcher.dispatch_many(
                [AppAction::StreamErrored {
                    message: err.to_string(),
                    stream_id,
                }],
                ctx,
            );
            return;
        }
    };

    while let Some(item) = stream.next().await {
        let action = match item {
            Ok(chunk) => AppAction::AppendResponseChunk { chunk, stream_id },
            Err(err) => {
                dispatcher.dispatch_many(
                    [AppAction::StreamErrored {
                        message: err.to_string(),
                        stream_id,
                    }],
                    ctx,
                );
                return;
            }
        };
        if !dispatcher.dispatch_many([action], ctx) {
            debug!(stream_id, "event loop gone, dropping reply");
            return;
        }
    }

    dispatcher.dispatch_many([AppAction::StreamCompleted { stream_id }], ctx);
}
