//! Lifecycle of one user→assistant exchange.
//!
//! An exchange moves Idle → Sending (request out, nothing received) →
//! Streaming (reply growing) → Idle. Events carry the `stream_id` handed out by
//! [`ReplyCoordinator::begin`]; anything tagged with another id belongs to an
//! exchange that already ended and is ignored.

use crate::core::chat_id::ChatId;
use crate::core::engine::CompletionChunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePhase {
    #[default]
    Idle,
    Sending,
    Streaming,
}

#[derive(Debug, Default)]
pub struct ReplyCoordinator {
    phase: ExchangePhase,
    current_stream_id: u64,
    origin: Option<ChatId>,
    reply: String,
}

impl ReplyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != ExchangePhase::Idle
    }

    pub fn can_submit(&self) -> bool {
        !self.is_busy()
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.is_busy() && self.current_stream_id == stream_id
    }

    /// The chat the outstanding exchange was started from.
    pub fn origin(&self) -> Option<&ChatId> {
        self.origin.as_ref()
    }

    /// The reply accumulated so far. Empty while Idle or Sending.
    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Starts an exchange for `chat`. Returns `None` while another one is
    /// outstanding.
    pub fn begin(&mut self, chat: ChatId) -> Option<u64> {
        if self.is_busy() {
            return None;
        }
        self.current_stream_id += 1;
        self.phase = ExchangePhase::Sending;
        self.origin = Some(chat);
        self.reply.clear();
        Some(self.current_stream_id)
    }

    /// Appends a chunk's text. The first chunk moves the exchange to
    /// Streaming, even when it carries no text. Returns the reply so far.
    pub fn push_chunk(&mut self, stream_id: u64, chunk: &CompletionChunk) -> Option<&str> {
        if !self.is_current_stream(stream_id) {
            return None;
        }
        self.phase = ExchangePhase::Streaming;
        self.reply.push_str(chunk.delta());
        Some(&self.reply)
    }

    /// Ends the exchange, handing back the originating chat and the full reply.
    pub fn complete(&mut self, stream_id: u64) -> Option<(ChatId, String)> {
        if !self.is_current_stream(stream_id) {
            return None;
        }
        self.phase = ExchangePhase::Idle;
        let reply = std::mem::take(&mut self.reply);
        self.origin.take().map(|origin| (origin, reply))
    }

    /// Ends the exchange and discards any partial reply. Returns whether the
    /// id matched the outstanding exchange.
    pub fn fail(&mut self, stream_id: u64) -> bool {
        if !self.is_current_stream(stream_id) {
            return false;
        }
        self.phase = ExchangePhase::Idle;
        self.origin = None;
        self.reply.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_is_refused_while_busy() {
        let mut coordinator = ReplyCoordinator::new();
        let first = coordinator.begin(ChatId::from("1")).unwrap();
        assert_eq!(coordinator.phase(), ExchangePhase::Sending);
        assert!(!coordinator.can_submit());

        assert_eq!(coordinator.begin(ChatId::from("2")), None);
        assert_eq!(coordinator.origin(), Some(&ChatId::from("1")));
        assert!(coordinator.is_current_stream(first));
    }

    #[test]
    fn reply_grows_as_a_prefix() {
        let mut coordinator = ReplyCoordinator::new();
        let id = coordinator.begin(ChatId::from("1")).unwrap();

        let mut seen = Vec::new();
        for part in ["¿", "En", " qué puedo ayudarte?"] {
            let reply = coordinator
                .push_chunk(id, &CompletionChunk::text(part))
                .unwrap()
                .to_string();
            seen.push(reply);
        }

        assert_eq!(coordinator.phase(), ExchangePhase::Streaming);
        assert_eq!(seen, vec!["¿", "¿En", "¿En qué puedo ayudarte?"]);
        assert_eq!(
            coordinator.complete(id),
            Some((ChatId::from("1"), "¿En qué puedo ayudarte?".to_string()))
        );
        assert_eq!(coordinator.phase(), ExchangePhase::Idle);
        assert!(coordinator.reply().is_empty());
    }

    #[test]
    fn empty_chunks_still_mark_streaming() {
        let mut coordinator = ReplyCoordinator::new();
        let id = coordinator.begin(ChatId::from("1")).unwrap();
        assert_eq!(
            coordinator.push_chunk(id, &CompletionChunk::default()),
            Some("")
        );
        assert_eq!(coordinator.phase(), ExchangePhase::Streaming);
    }

    #[test]
    fn failure_discards_partial_reply() {
        let mut coordinator = ReplyCoordinator::new();
        let id = coordinator.begin(ChatId::from("1")).unwrap();
        coordinator.push_chunk(id, &CompletionChunk::text("medio"));

        assert!(coordinator.fail(id));
        assert_eq!(coordinator.phase(), ExchangePhase::Idle);
        assert!(coordinator.reply().is_empty());
        assert_eq!(coordinator.origin(), None);
        assert!(coordinator.can_submit());
    }

    #[test]
    fn events_from_finished_exchanges_are_ignored() {
        let mut coordinator = ReplyCoordinator::new();
        let old = coordinator.begin(ChatId::from("1")).unwrap();
        coordinator.fail(old);
        let current = coordinator.begin(ChatId::from("1")).unwrap();

        assert_ne!(old, current);
        assert_eq!(
            coordinator.push_chunk(old, &CompletionChunk::text("tarde")),
            None
        );
        assert_eq!(coordinator.complete(old), None);
        assert!(!coordinator.fail(old));
        assert_eq!(coordinator.phase(), ExchangePhase::Sending);
    }
}
