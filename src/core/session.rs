use crate::core::chat_id::ChatId;
use crate::core::message::Message;
use crate::core::records::{read_record, write_record, RecordError};
use crate::core::store::KeyValueStore;

/// The active conversation: its id and ordered messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    id: ChatId,
    messages: Vec<Message>,
}

impl ChatSession {
    /// A session with no messages. Nothing is written until the first save.
    pub fn new(id: ChatId) -> Self {
        Self {
            id,
            messages: Vec::new(),
        }
    }

    /// Reads the stored messages for `id`; a chat that was never saved loads empty.
    pub fn load(store: &dyn KeyValueStore, id: ChatId) -> Result<Self, RecordError> {
        let messages = read_messages(store, &id)?;
        Ok(Self { id, messages })
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), RecordError> {
        write_record(store, self.id.as_str(), &self.messages)
    }

    pub fn id(&self) -> &ChatId {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }
}

pub fn read_messages(store: &dyn KeyValueStore, id: &ChatId) -> Result<Vec<Message>, RecordError> {
    Ok(read_record(store, id.as_str())?.unwrap_or_default())
}
