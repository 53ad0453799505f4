//! Owner of the store, the name registry and the active chat session.
//!
//! Every mutating operation finishes by refreshing [`SessionManager::entries`],
//! the list the chat sidebar renders, so names and the active marker are never
//! stale.

use tracing::{debug, info, warn};

use crate::core::chat_id::ChatId;
use crate::core::message::Message;
use crate::core::records::{write_record, RecordError};
use crate::core::registry::ChatRegistry;
use crate::core::session::{read_messages, ChatSession};
use crate::core::store::KeyValueStore;

/// One row of the chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: ChatId,
    pub name: String,
    pub active: bool,
}

/// What happened to the active chat after a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Another chat was deleted; the active one is untouched.
    Removed,
    /// The active chat was deleted and an existing chat took its place.
    SwitchedTo(ChatId),
    /// The active chat was the last one; a fresh empty chat is now active.
    StartedFresh(ChatId),
}

pub struct SessionManager {
    store: Box<dyn KeyValueStore>,
    registry: ChatRegistry,
    session: ChatSession,
    entries: Vec<ChatEntry>,
}

impl SessionManager {
    /// Opens the store. With `resume_last`, the most recent stored chat becomes
    /// active; otherwise a fresh, unsaved chat does.
    pub fn open(store: Box<dyn KeyValueStore>, resume_last: bool) -> Result<Self, RecordError> {
        let registry = match ChatRegistry::load(store.as_ref()) {
            Ok(registry) => registry,
            Err(RecordError::Corrupt { key, source }) => {
                warn!(%key, error = %source, "ignoring unreadable chat names");
                ChatRegistry::default()
            }
            Err(err) => return Err(err),
        };

        let mut stored = ChatRegistry::list_sessions(store.as_ref())?;
        for id in &stored {
            id.reserve();
        }
        let resumed = if resume_last { stored.pop() } else { None };
        let session = match resumed {
            Some(id) => {
                info!(chat = %id, "resuming chat");
                ChatSession::load(store.as_ref(), id)?
            }
            None => ChatSession::new(ChatId::generate()),
        };

        let mut manager = Self {
            store,
            registry,
            session,
            entries: Vec::new(),
        };
        manager.refresh()?;
        Ok(manager)
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn active_id(&self) -> &ChatId {
        self.session.id()
    }

    pub fn messages(&self) -> &[Message] {
        self.session.messages()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn display_name(&self, id: &ChatId) -> String {
        self.registry.display_name(id)
    }

    /// The name the user gave `id`, if any.
    pub fn custom_name(&self, id: &ChatId) -> Option<&str> {
        self.registry.name(id)
    }

    pub fn contains(&self, id: &ChatId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    /// Re-derives the chat list from the store and registry.
    pub fn refresh(&mut self) -> Result<(), RecordError> {
        let active = self.session.id().clone();
        self.entries = ChatRegistry::list_sessions(self.store.as_ref())?
            .into_iter()
            .map(|id| ChatEntry {
                name: self.registry.display_name(&id),
                active: id == active,
                id,
            })
            .collect();
        Ok(())
    }

    /// Starts an empty chat under a fresh id. Nothing is stored until the
    /// first save.
    pub fn new_chat(&mut self) -> Result<ChatId, RecordError> {
        let id = ChatId::generate();
        debug!(chat = %id, "starting new chat");
        self.session = ChatSession::new(id.clone());
        self.refresh()?;
        Ok(id)
    }

    /// Makes `id` the active chat. Unsaved state of the previous chat is dropped.
    pub fn switch_to(&mut self, id: ChatId) -> Result<(), RecordError> {
        debug!(chat = %id, "switching chat");
        self.session = ChatSession::load(self.store.as_ref(), id)?;
        self.refresh()
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.session.append_user(text);
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.session.append_assistant(text);
    }

    /// Persists the active chat and refreshes the list so a first save makes
    /// the chat visible.
    pub fn save(&mut self) -> Result<(), RecordError> {
        self.session.save(self.store.as_mut())?;
        self.refresh()
    }

    /// Files a finished assistant reply under `chat`, which may no longer be
    /// the active chat.
    pub fn append_reply(&mut self, chat: &ChatId, content: String) -> Result<(), RecordError> {
        if chat == self.session.id() {
            self.session.append_assistant(content);
            return self.save();
        }

        debug!(chat = %chat, "filing reply under inactive chat");
        let mut messages = read_messages(self.store.as_ref(), chat)?;
        messages.push(Message::assistant(content));
        write_record(self.store.as_mut(), chat.as_str(), &messages)?;
        self.refresh()
    }

    /// Returns `false` without touching anything when `new_name` is blank.
    pub fn rename(&mut self, id: &ChatId, new_name: &str) -> Result<bool, RecordError> {
        let renamed = self.registry.rename(self.store.as_mut(), id, new_name)?;
        if renamed {
            self.refresh()?;
        }
        Ok(renamed)
    }

    /// Removes the chat's messages and name. Deleting the active chat moves to
    /// the most recent remaining chat, or to a fresh one when none is left.
    ///
    /// The name goes first: if that write fails nothing has been removed and
    /// the chat stays listed and active.
    pub fn delete(&mut self, id: &ChatId) -> Result<DeleteOutcome, RecordError> {
        info!(chat = %id, "deleting chat");
        self.registry.forget(self.store.as_mut(), id)?;
        if let Err(err) = self.store.remove(id.as_str()) {
            warn!(chat = %id, error = %err, "could not remove chat messages");
            self.refresh()?;
            return Err(err.into());
        }

        if id != self.session.id() {
            self.refresh()?;
            return Ok(DeleteOutcome::Removed);
        }

        match ChatRegistry::list_sessions(self.store.as_ref())?.pop() {
            Some(next) => {
                self.switch_to(next.clone())?;
                Ok(DeleteOutcome::SwitchedTo(next))
            }
            None => {
                let fresh = self.new_chat()?;
                Ok(DeleteOutcome::StartedFresh(fresh))
            }
        }
    }
}
