//! Interactive chat: terminal setup, the event loop, and the background
//! tasks it starts.

pub mod executors;
pub mod keybindings;
pub mod lifecycle;

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use self::executors::{spawn_engine_initializer, spawn_exchange};
use self::keybindings::{handle_key, KeyResult};
use self::lifecycle::{restore_terminal, setup_terminal};
use crate::core::app::{
    apply_actions, App, AppActionContext, AppActionDispatcher, AppActionEnvelope, AppCommand,
};
use crate::core::engine::ChatEngine;
use crate::ui::renderer::ui;

const MAX_FPS: u64 = 60;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// Turns pending terminal events into actions. Returns whether anything
/// changed on screen.
fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    ctx: AppActionContext,
) -> bool {
    let mut changed = false;
    while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => match handle_key(app, key) {
                KeyResult::Actions(actions) => {
                    dispatcher.dispatch_many(actions, ctx);
                    changed = true;
                }
                KeyResult::Edited => changed = true,
                KeyResult::Ignored => {}
            },
            Event::Paste(text) => {
                app.ui.textarea.insert_str(text);
                changed = true;
            }
            Event::Resize(_, _) => changed = true,
            _ => {}
        }
    }
    changed
}

/// Applies every queued action and starts the work the reducer asked for.
pub fn drain_action_queue(
    app: &mut App,
    engine: &Arc<dyn ChatEngine>,
    dispatcher: &AppActionDispatcher,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }
    if pending.is_empty() {
        return false;
    }

    for cmd in apply_actions(app, pending) {
        match cmd {
            AppCommand::SpawnExchange {
                messages,
                stream_id,
            } => {
                debug!(stream_id, messages = messages.len(), "starting exchange");
                spawn_exchange(engine.clone(), dispatcher.clone(), messages, stream_id);
            }
        }
    }
    true
}

pub async fn run_chat(mut app: App, engine: Arc<dyn ChatEngine>) -> Result<(), Box<dyn Error>> {
    let mut terminal = setup_terminal()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let event_reader_handle = spawn_event_reader(event_tx);
    let init_handle = spawn_engine_initializer(engine.clone(), dispatcher.clone());
    info!(chats = app.chats.entries().len(), "chat started");

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = loop {
        if app.ui.exit_requested {
            break Ok(());
        }

        if request_redraw && last_draw.elapsed() >= frame_duration {
            if let Err(err) = terminal.draw(|f| ui(f, &app)) {
                break Err(err.into());
            }
            last_draw = Instant::now();
            request_redraw = false;
        }

        let size = terminal.size().unwrap_or_default();
        let ctx = AppActionContext {
            term_width: size.width,
            term_height: size.height,
        };

        let events_changed = process_ui_events(&mut app, &mut event_rx, &dispatcher, ctx);
        let actions_applied = drain_action_queue(&mut app, &engine, &dispatcher, &mut action_rx);
        if events_changed || actions_applied {
            request_redraw = true;
        }

        if !events_changed && !actions_applied {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    init_handle.abort();
    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    info!("chat closed");

    result
}
