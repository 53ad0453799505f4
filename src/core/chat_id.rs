use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Prefix used when a chat has no user-chosen name.
pub const FALLBACK_NAME_LABEL: &str = "Chat";

static LAST_ISSUED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Identifier of one conversation thread.
///
/// Fresh ids are the creation time in Unix milliseconds. Ids issued by one
/// process strictly increase even when the clock stalls or steps back.
/// Ids read back from storage are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_millis();
        let mut last = LAST_ISSUED_MILLIS.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_ISSUED_MILLIS.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(next.to_string()),
                Err(observed) => last = observed,
            }
        }
    }

    /// Makes later [`ChatId::generate`] calls issue ids past this one, so a
    /// stored chat dated ahead of the clock is never overwritten.
    pub fn reserve(&self) {
        if let Some(millis) = self.timestamp_millis() {
            LAST_ISSUED_MILLIS.fetch_max(millis, Ordering::Relaxed);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creation time encoded in the id, if it is a timestamp id.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.0.parse::<i64>().ok().filter(|millis| *millis >= 0)
    }

    /// Name shown for chats the user never renamed, e.g. `Chat 2024-05-01 18:30:12`.
    pub fn fallback_name(&self) -> String {
        let formatted = self
            .timestamp_millis()
            .and_then(|millis| Local.timestamp_millis_opt(millis).single())
            .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string());
        match formatted {
            Some(when) => format!("{FALLBACK_NAME_LABEL} {when}"),
            None => format!("{FALLBACK_NAME_LABEL} {}", self.0),
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChatId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for ChatId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Oldest first; timestamp ids compare numerically, anything else sorts after them.
pub fn sort_chronologically(ids: &mut [ChatId]) {
    ids.sort_by(|a, b| match (a.timestamp_millis(), b.timestamp_millis()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.0.cmp(&b.0)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_strictly_increase() {
        let ids: Vec<ChatId> = (0..50).map(|_| ChatId::generate()).collect();
        for pair in ids.windows(2) {
            let a = pair[0].timestamp_millis().unwrap();
            let b = pair[1].timestamp_millis().unwrap();
            assert!(b > a, "{b} should be greater than {a}");
        }
    }

    #[test]
    fn reserved_id_pushes_generation_past_it() {
        let ahead = Utc::now().timestamp_millis() + 60_000;
        ChatId::from(ahead.to_string()).reserve();
        assert!(ChatId::generate().timestamp_millis().unwrap() > ahead);

        // Non-timestamp ids are ignored.
        ChatId::from("notes").reserve();
    }

    #[test]
    fn fallback_name_uses_local_time() {
        let id = ChatId::from("1700000000000");
        let expected = Local
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(id.fallback_name(), format!("Chat {expected}"));
    }

    #[test]
    fn fallback_name_for_non_timestamp_ids() {
        assert_eq!(ChatId::from("imported").fallback_name(), "Chat imported");
    }

    #[test]
    fn chronological_sort_is_numeric() {
        let mut ids = vec![
            ChatId::from("900"),
            ChatId::from("zeta"),
            ChatId::from("10000"),
            ChatId::from("alpha"),
        ];
        sort_chronologically(&mut ids);
        let ordered: Vec<&str> = ids.iter().map(ChatId::as_str).collect();
        assert_eq!(ordered, vec!["900", "10000", "alpha", "zeta"]);
    }
}
