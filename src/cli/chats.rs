//! Chat management without the terminal UI: `list`, `show`, `rename`, `delete`.

use std::error::Error;
use std::io::Write;

use crate::core::chat_id::ChatId;
use crate::core::manager::SessionManager;
use crate::core::session::read_messages;

/// Finds a stored chat by id, by exact display name, or by its 1-based
/// position in `hilos list`.
pub fn resolve_chat(manager: &SessionManager, selector: &str) -> Option<ChatId> {
    let entries = manager.entries();
    let selector = selector.trim();

    if let Some(entry) = entries.iter().find(|entry| entry.id.as_str() == selector) {
        return Some(entry.id.clone());
    }
    if let Some(entry) = entries.iter().find(|entry| entry.name == selector) {
        return Some(entry.id.clone());
    }
    selector
        .parse::<usize>()
        .ok()
        .filter(|position| *position >= 1)
        .and_then(|position| entries.get(position - 1))
        .map(|entry| entry.id.clone())
}

fn require_chat(manager: &SessionManager, selector: &str) -> Result<ChatId, Box<dyn Error>> {
    resolve_chat(manager, selector).ok_or_else(|| {
        format!("No chat matches '{selector}'. Run 'hilos list' to see the stored chats.").into()
    })
}

pub fn list_chats(manager: &SessionManager, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let entries = manager.entries();
    if entries.is_empty() {
        writeln!(out, "No chats stored yet.")?;
        return Ok(());
    }

    for (index, entry) in entries.iter().enumerate() {
        let count = read_messages(manager.store(), &entry.id)?.len();
        let noun = if count == 1 { "message" } else { "messages" };
        writeln!(
            out,
            "{:>3}. {}  [{}, {count} {noun}]",
            index + 1,
            entry.name,
            entry.id
        )?;
    }
    Ok(())
}

pub fn show_chat(
    manager: &SessionManager,
    selector: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let id = require_chat(manager, selector)?;
    writeln!(out, "# {}", manager.display_name(&id))?;

    for message in read_messages(manager.store(), &id)? {
        let label = if message.is_user() { "You" } else { "AI" };
        writeln!(out)?;
        writeln!(out, "{label}: {}", message.content)?;
    }
    Ok(())
}

pub fn rename_chat(
    manager: &mut SessionManager,
    selector: &str,
    new_name: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let id = require_chat(manager, selector)?;
    if !manager.rename(&id, new_name)? {
        return Err("The new name is empty; nothing was changed.".into());
    }
    writeln!(out, "✅ Renamed chat {id} to: {}", new_name.trim())?;
    Ok(())
}

pub fn delete_chat(
    manager: &mut SessionManager,
    selector: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let id = require_chat(manager, selector)?;
    let name = manager.display_name(&id);
    manager.delete(&id)?;
    writeln!(out, "🗑️  Deleted chat: {name}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::REGISTRY_KEY;
    use crate::core::store::{KeyValueStore, MemoryStore};

    fn manager() -> SessionManager {
        let mut store = MemoryStore::new();
        store
            .set(
                "1000",
                r#"[{"role":"user","content":"Hola"},{"role":"assistant","content":"¿En qué puedo ayudarte?"}]"#,
            )
            .unwrap();
        store
            .set("2000", r#"[{"role":"user","content":"dos"}]"#)
            .unwrap();
        store.set(REGISTRY_KEY, r#"{"2000":"Recetas"}"#).unwrap();
        SessionManager::open(Box::new(store), false).unwrap()
    }

    fn output(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn selectors_match_id_name_or_position() {
        let manager = manager();
        assert_eq!(resolve_chat(&manager, "1000"), Some(ChatId::from("1000")));
        assert_eq!(resolve_chat(&manager, "Recetas"), Some(ChatId::from("2000")));
        assert_eq!(resolve_chat(&manager, "2"), Some(ChatId::from("2000")));
        assert_eq!(resolve_chat(&manager, "0"), None);
        assert_eq!(resolve_chat(&manager, "Nada"), None);
    }

    #[test]
    fn list_shows_names_and_message_counts() {
        let manager = manager();
        let text = output(|out| list_chats(&manager, out).unwrap());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[1000, 2 messages]"));
        assert_eq!(lines[1], "  2. Recetas  [2000, 1 message]");
    }

    #[test]
    fn show_prints_the_transcript() {
        let manager = manager();
        let text = output(|out| show_chat(&manager, "1", out).unwrap());
        assert!(text.contains("You: Hola\n"));
        assert!(text.contains("AI: ¿En qué puedo ayudarte?\n"));
    }

    #[test]
    fn rename_and_delete_update_the_store() {
        let mut manager = manager();
        output(|out| rename_chat(&mut manager, "1000", "Saludos", out).unwrap());
        assert_eq!(manager.display_name(&ChatId::from("1000")), "Saludos");

        assert!(rename_chat(&mut manager, "Saludos", "  ", &mut Vec::new()).is_err());

        output(|out| delete_chat(&mut manager, "Recetas", out).unwrap());
        assert_eq!(manager.store().get("2000").unwrap(), None);
        assert_eq!(manager.entries().len(), 1);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let manager = SessionManager::open(Box::new(MemoryStore::new()), false).unwrap();
        assert_eq!(
            output(|out| list_chats(&manager, out).unwrap()),
            "No chats stored yet.\n"
        );
        assert!(show_chat(&manager, "1", &mut Vec::new()).is_err());
    }
}
