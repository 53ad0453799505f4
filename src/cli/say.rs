//! TUI-less "say" command: one exchange, streamed to stdout.

use std::error::Error;
use std::io::Write;

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::core::engine::{ChatEngine, InitProgress};
use crate::core::manager::SessionManager;
use crate::core::message::Message;

/// Sends `prompt` as the first message of a new chat and writes the reply to
/// `out` as it arrives. With a `manager`, the exchange is stored like one made
/// in the terminal UI; without one nothing is written to disk.
pub async fn run_say(
    engine: &dyn ChatEngine,
    manager: Option<&mut SessionManager>,
    prompt: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    engine
        .initialize(&|report: InitProgress| {
            debug!(progress = report.progress, "{}", report.text)
        })
        .await?;

    let mut manager = manager;
    let origin = match manager.as_deref_mut() {
        Some(manager) => {
            manager.append_user(prompt);
            manager.save()?;
            Some(manager.active_id().clone())
        }
        None => None,
    };

    let mut stream = engine
        .create_completion(vec![Message::user(prompt)])
        .await?;
    let mut reply = String::new();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        write!(out, "{}", chunk.delta())?;
        out.flush()?;
        reply.push_str(chunk.delta());
    }
    writeln!(out)?;

    if let (Some(manager), Some(origin)) = (manager, origin) {
        manager.append_reply(&origin, reply)?;
        info!(chat = %origin, "saved one-shot exchange");
    }
    Ok(())
}
