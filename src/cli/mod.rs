//! Command-line interface parsing and handling
//!
//! This module parses the arguments, sets up logging and configuration, and
//! dispatches to the interactive chat or to one of the one-shot commands.

pub mod chats;
pub mod model_list;
pub mod say;
pub mod settings;

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::chats::{delete_chat, list_chats, rename_chat, show_chat};
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{apply_set, apply_unset, format_all, SettingError, SettingRegistry};
use crate::core::app::{App, AppSettings};
use crate::core::chat_stream::{HttpEngine, HttpEngineSettings};
use crate::core::config::data::{path_display, Config};
use crate::core::config::defaults::{ConfigOverrides, ResolvedConfig};
use crate::core::manager::SessionManager;
use crate::core::store::{FileStore, KeyValueStore, MemoryStore};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LogTarget};
use crate::utils::url::validate_base_url;

#[derive(Parser, Debug)]
#[command(name = "hilos", version)]
#[command(about = "A terminal chat client for a local language model")]
#[command(
    long_about = "Hilos keeps several conversation threads on disk and streams replies from a \
locally running engine that speaks the OpenAI chat/completions protocol (Ollama, llama.cpp \
server, LM Studio and similar).\n\n\
Environment Variables (used when neither a flag nor the config file sets a value):\n\
  HILOS_BASE_URL    Engine address (default http://localhost:11434/v1)\n\
  HILOS_MODEL       Model name (default gemma2:2b)\n\
  HILOS_API_KEY     Bearer token sent with every request (optional)\n\
  RUST_LOG          Log filter when logging is enabled\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a newline\n\
  Ctrl+N            Start a new chat\n\
  Tab               Focus the chat list (Up/Down, Enter open, r rename, d delete)\n\
  PageUp/PageDown   Scroll the transcript\n\
  Esc               Go back\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to ask for replies
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible engine
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Directory holding the stored chats
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep chats in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List the stored chats
    List,
    /// Print a stored chat
    Show {
        /// Chat id, name, or position in `hilos list`
        chat: String,
    },
    /// Give a stored chat a name
    Rename {
        /// Chat id, name, or position in `hilos list`
        chat: String,
        /// The new name (may be several words)
        #[arg(required = true, trailing_var_arg = true)]
        name: Vec<String>,
    },
    /// Delete a stored chat
    Delete {
        /// Chat id, name, or position in `hilos list`
        chat: String,
    },
    /// Send one message and print the streamed reply
    Say {
        /// Do not store the exchange
        #[arg(long)]
        no_save: bool,
        /// The message (may be several words)
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Set a configuration value, or show all values when no key is given
    Set {
        key: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset { key: String },
    /// List the models the engine serves
    Models,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            data_dir: self.data_dir.clone(),
        }
    }

    fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Chat))
    }
}

pub fn engine_settings(resolved: &ResolvedConfig) -> Result<HttpEngineSettings, String> {
    Ok(HttpEngineSettings {
        base_url: validate_base_url(&resolved.base_url)?,
        model: resolved.model.clone(),
        api_key: resolved.api_key.clone(),
        idle_timeout: resolved.stream_idle_timeout,
    })
}

fn open_store(
    resolved: &ResolvedConfig,
    ephemeral: bool,
) -> Result<Box<dyn KeyValueStore>, Box<dyn Error>> {
    if ephemeral {
        debug!("using in-memory chat store");
        return Ok(Box::new(MemoryStore::new()));
    }
    debug!(dir = %path_display(&resolved.data_dir), "opening chat store");
    Ok(Box::new(FileStore::open(resolved.data_dir.clone())?))
}

pub fn main() {
    let args = Args::parse();

    let target = LogTarget::choose(args.log.as_deref(), args.is_interactive());
    if let Err(err) = init_tracing(target) {
        eprintln!("❌ Cannot open log file: {err}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("❌ Failed to start the async runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(async_main(args)) {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}

fn exit_on_setting_error(result: Result<String, SettingError>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(err) => {
            err.print();
            std::process::exit(1);
        }
    }
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.clone().unwrap_or(Commands::Chat);

    match &command {
        Commands::Set { key: None, .. } => {
            let config = Config::load()?;
            println!("hilos configuration ({})", path_display(Config::get_config_path()?));
            for line in format_all(&SettingRegistry::new(), &config) {
                println!("{line}");
            }
            return Ok(());
        }
        Commands::Set {
            key: Some(key),
            value,
        } => {
            exit_on_setting_error(apply_set(&Config::get_config_path()?, key, value));
            return Ok(());
        }
        Commands::Unset { key } => {
            exit_on_setting_error(apply_unset(&Config::get_config_path()?, key));
            return Ok(());
        }
        _ => {}
    }

    let resolved = Config::load()?.resolve(&args.overrides())?;
    let engine = HttpEngine::new(engine_settings(&resolved)?);
    let mut stdout = io::stdout().lock();

    match &command {
        Commands::Chat => {
            let manager = SessionManager::open(
                open_store(&resolved, args.ephemeral)?,
                resolved.resume_last,
            )?;
            let app = App::new(
                manager,
                AppSettings {
                    model: resolved.model.clone(),
                    greeting: resolved.greeting,
                },
            );
            drop(stdout);
            run_chat(app, Arc::new(engine)).await
        }
        Commands::List => {
            let manager = SessionManager::open(open_store(&resolved, args.ephemeral)?, false)?;
            list_chats(&manager, &mut stdout)
        }
        Commands::Show { chat } => {
            let manager = SessionManager::open(open_store(&resolved, args.ephemeral)?, false)?;
            show_chat(&manager, chat, &mut stdout)
        }
        Commands::Rename { chat, name } => {
            let mut manager =
                SessionManager::open(open_store(&resolved, args.ephemeral)?, false)?;
            rename_chat(&mut manager, chat, &name.join(" "), &mut stdout)
        }
        Commands::Delete { chat } => {
            let mut manager =
                SessionManager::open(open_store(&resolved, args.ephemeral)?, false)?;
            delete_chat(&mut manager, chat, &mut stdout)
        }
        Commands::Say { no_save, prompt } => {
            let prompt = prompt.join(" ");
            if *no_save {
                run_say(&engine, None, &prompt, &mut stdout).await
            } else {
                let mut manager =
                    SessionManager::open(open_store(&resolved, args.ephemeral)?, false)?;
                run_say(&engine, Some(&mut manager), &prompt, &mut stdout).await
            }
        }
        Commands::Models => list_models(&engine, &mut stdout).await,
        Commands::Set { .. } | Commands::Unset { .. } => Ok(()),
    }
}
