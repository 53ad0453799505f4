//! Hilos is a terminal chat client whose conversation threads live in a
//! key-value store and whose replies stream from a local OpenAI-compatible
//! engine.
//!
//! The crate is organized in a few layers:
//! - [`core`] owns the stored chats, the chat registry, the session manager,
//!   the reply coordinator, and the engine client.
//! - [`ui`] renders the terminal interface and runs the event loop.
//! - [`cli`] parses arguments and dispatches to the interactive chat or to
//!   one-shot commands.
//! - [`api`] defines the wire payloads exchanged with the engine.
//!
//! The binary in `src/main.rs` only calls [`cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
