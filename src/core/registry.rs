//! User-chosen chat names and the list of chats known to the store.

use std::collections::BTreeMap;

use crate::core::chat_id::{sort_chronologically, ChatId};
use crate::core::records::{read_record, write_record, RecordError};
use crate::core::store::KeyValueStore;

/// Store key holding the serialized name map. Never a chat id.
pub const REGISTRY_KEY: &str = "chatNames";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChatRegistry {
    names: BTreeMap<ChatId, String>,
}

impl ChatRegistry {
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, RecordError> {
        let names = read_record(store, REGISTRY_KEY)?.unwrap_or_default();
        Ok(Self { names })
    }

    /// Every chat that has been saved at least once, oldest first.
    pub fn list_sessions(store: &dyn KeyValueStore) -> Result<Vec<ChatId>, RecordError> {
        let mut ids: Vec<ChatId> = store
            .keys()?
            .into_iter()
            .filter(|key| key != REGISTRY_KEY)
            .map(ChatId::from)
            .collect();
        sort_chronologically(&mut ids);
        Ok(ids)
    }

    pub fn name(&self, id: &ChatId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn display_name(&self, id: &ChatId) -> String {
        self.name(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.fallback_name())
    }

    /// Names `id` and persists the registry. Blank names leave everything
    /// untouched and return `false`.
    pub fn rename(
        &mut self,
        store: &mut dyn KeyValueStore,
        id: &ChatId,
        new_name: &str,
    ) -> Result<bool, RecordError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Ok(false);
        }
        self.names.insert(id.clone(), new_name.to_string());
        self.persist(store)?;
        Ok(true)
    }

    /// Drops the name for `id` and persists the registry. The chat's messages
    /// are the caller's responsibility. A failed write keeps the name.
    pub fn forget(
        &mut self,
        store: &mut dyn KeyValueStore,
        id: &ChatId,
    ) -> Result<(), RecordError> {
        let Some(previous) = self.names.remove(id) else {
            return Ok(());
        };
        if let Err(err) = self.persist(store) {
            self.names.insert(id.clone(), previous);
            return Err(err);
        }
        Ok(())
    }

    fn persist(&self, store: &mut dyn KeyValueStore) -> Result<(), RecordError> {
        write_record(store, REGISTRY_KEY, &self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[test]
    fn list_sessions_skips_the_registry_key() {
        let mut store = MemoryStore::new();
        store.set("2000", "[]").unwrap();
        store.set("1000", "[]").unwrap();
        store.set(REGISTRY_KEY, "{}").unwrap();

        let ids = ChatRegistry::list_sessions(&store).unwrap();
        assert_eq!(ids, vec![ChatId::from("1000"), ChatId::from("2000")]);
    }

    #[test]
    fn unsaved_chats_are_not_listed() {
        let store = MemoryStore::new();
        let _fresh = ChatId::generate();
        assert!(ChatRegistry::list_sessions(&store).unwrap().is_empty());
    }

    #[test]
    fn rename_persists_the_whole_registry() {
        let mut store = MemoryStore::new();
        let mut registry = ChatRegistry::default();
        let first = ChatId::from("1000");
        let second = ChatId::from("2000");

        assert!(registry.rename(&mut store, &first, "Recetas").unwrap());
        assert!(registry.rename(&mut store, &second, "  Viajes  ").unwrap());

        let reloaded = ChatRegistry::load(&store).unwrap();
        assert_eq!(reloaded.display_name(&first), "Recetas");
        assert_eq!(reloaded.display_name(&second), "Viajes");
        assert_eq!(
            store.get(REGISTRY_KEY).unwrap().as_deref(),
            Some(r#"{"1000":"Recetas","2000":"Viajes"}"#)
        );
    }

    #[test]
    fn blank_rename_keeps_previous_name() {
        let mut store = MemoryStore::new();
        let mut registry = ChatRegistry::default();
        let id = ChatId::from("1000");
        registry.rename(&mut store, &id, "Recetas").unwrap();

        assert!(!registry.rename(&mut store, &id, "").unwrap());
        assert!(!registry.rename(&mut store, &id, "   ").unwrap());
        assert_eq!(registry.display_name(&id), "Recetas");
    }

    #[test]
    fn forget_falls_back_to_timestamp_name() {
        let mut store = MemoryStore::new();
        let mut registry = ChatRegistry::default();
        let id = ChatId::from("1700000000000");
        registry.rename(&mut store, &id, "Recetas").unwrap();

        registry.forget(&mut store, &id).unwrap();

        assert_eq!(registry.display_name(&id), id.fallback_name());
        assert_eq!(ChatRegistry::load(&store).unwrap(), ChatRegistry::default());
    }

    #[test]
    fn load_without_record_is_empty() {
        let store = MemoryStore::new();
        assert_eq!(ChatRegistry::load(&store).unwrap(), ChatRegistry::default());
    }

    #[test]
    fn corrupt_registry_is_reported() {
        let mut store = MemoryStore::new();
        store.set(REGISTRY_KEY, "not json").unwrap();
        assert!(matches!(
            ChatRegistry::load(&store),
            Err(RecordError::Corrupt { .. })
        ));
    }
}
