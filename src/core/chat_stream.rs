//! [`ChatEngine`] backed by an OpenAI-compatible HTTP server (Ollama, llama.cpp,
//! LM Studio, vLLM...), reading `chat/completions` replies as server-sent events.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use memchr::memchr;
use tracing::{debug, warn};

use crate::api::models::{fetch_models, model_is_listed, sorted_model_ids};
use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::engine::{
    ChatEngine, CompletionChunk, CompletionStream, EngineError, InitProgress,
};
use crate::core::message::Message;
use crate::utils::url::construct_api_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEngineSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Longest allowed silence while waiting for the next part of a reply.
    pub idle_timeout: Option<Duration>,
}

pub struct HttpEngine {
    client: reqwest::Client,
    settings: HttpEngineSettings,
}

impl HttpEngine {
    pub fn new(settings: HttpEngineSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &HttpEngineSettings {
        &self.settings
    }

    pub async fn list_models(&self) -> Result<Vec<String>, EngineError> {
        let listing = fetch_models(
            &self.client,
            &self.settings.base_url,
            self.settings.api_key.as_deref(),
        )
        .await?;
        Ok(sorted_model_ids(&listing))
    }

    async fn send_chat_request(
        &self,
        messages: Vec<Message>,
    ) -> Result<reqwest::Response, EngineError> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: true,
        };

        let chat_url = construct_api_url(&self.settings.base_url, "chat/completions");
        let mut http_request = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.settings.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {key}"));
        }

        let pending = http_request.json(&request).send();
        let sent = match self.settings.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| EngineError::Timeout(limit))?,
            None => pending.await,
        };
        sent.map_err(|e| EngineError::Request(e.to_string()))
    }
}

#[async_trait]
impl ChatEngine for HttpEngine {
    async fn initialize(
        &self,
        on_progress: &(dyn Fn(InitProgress) + Send + Sync),
    ) -> Result<(), EngineError> {
        let model = &self.settings.model;
        on_progress(InitProgress::new(
            0.0,
            format!("Connecting to {}", self.settings.base_url),
        ));

        let available = self.list_models().await?;
        on_progress(InitProgress::new(
            0.5,
            format!("Engine reachable, {} models listed", available.len()),
        ));

        // Some servers load models on demand and list nothing.
        if !available.is_empty() && !model_is_listed(&available, model) {
            return Err(EngineError::ModelUnavailable {
                model: model.clone(),
                available,
            });
        }

        on_progress(InitProgress::new(1.0, format!("Model {model} ready")));
        Ok(())
    }

    async fn create_completion(
        &self,
        messages: Vec<Message>,
    ) -> Result<CompletionStream, EngineError> {
        debug!(
            model = %self.settings.model,
            messages = messages.len(),
            "requesting completion"
        );
        let response = self.send_chat_request(messages).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(%status, "engine rejected completion request");
            return Err(EngineError::Api(describe_api_error(&error_text)));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(sse_chunks(body, self.settings.idle_timeout))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SseEvent {
    Chunk(CompletionChunk),
    Done,
    Error(String),
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Interprets one `data:` payload. Blank payloads yield nothing.
fn parse_data_payload(payload: &str) -> Option<SseEvent> {
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }
    if payload.trim().is_empty() {
        return None;
    }

    if let Ok(response) = serde_json::from_str::<ChatResponse>(payload) {
        let delta_content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content);
        return Some(SseEvent::Chunk(CompletionChunk { delta_content }));
    }

    Some(SseEvent::Error(describe_api_error(payload)))
}

/// Splits a byte stream into lines and turns `data:` lines into events.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            events.extend(Self::decode_line(&line[..newline_pos]));
        }
        events
    }

    /// Flushes a final line that was not newline-terminated.
    fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        Self::decode_line(&rest).into_iter().collect()
    }

    fn decode_line(raw: &[u8]) -> Option<SseEvent> {
        match std::str::from_utf8(raw) {
            Ok(line) => extract_data_payload(line.trim()).and_then(parse_data_payload),
            Err(e) => {
                warn!("Invalid UTF-8 in stream: {e}");
                None
            }
        }
    }
}

struct SseState {
    body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    idle_timeout: Option<Duration>,
    finished: bool,
}

fn sse_chunks(
    body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    idle_timeout: Option<Duration>,
) -> CompletionStream {
    let state = SseState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        idle_timeout,
        finished: false,
    };
    stream::unfold(state, next_chunk).boxed()
}

async fn next_chunk(
    mut state: SseState,
) -> Option<(Result<CompletionChunk, EngineError>, SseState)> {
    loop {
        if let Some(event) = state.pending.pop_front() {
            match event {
                SseEvent::Chunk(chunk) => return Some((Ok(chunk), state)),
                SseEvent::Done => return None,
                SseEvent::Error(message) => {
                    state.pending.clear();
                    state.finished = true;
                    return Some((Err(EngineError::Api(message)), state));
                }
            }
        }
        if state.finished {
            return None;
        }

        let next = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, state.body.next()).await {
                Ok(next) => next,
                Err(_) => {
                    state.finished = true;
                    return Some((Err(EngineError::Timeout(limit)), state));
                }
            },
            None => state.body.next().await,
        };

        match next {
            Some(Ok(bytes)) => {
                let events = state.decoder.push(&bytes);
                state.pending.extend(events);
            }
            Some(Err(e)) => {
                state.finished = true;
                return Some((Err(EngineError::Request(e.to_string())), state));
            }
            None => {
                // Connection closed without [DONE]; whatever was decoded still counts.
                let events = state.decoder.finish();
                state.pending.extend(events);
                state.finished = true;
            }
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))
        .map(str::to_owned)
}

/// One-line description of an error body, preferring the JSON `message`.
fn describe_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "Engine error: <empty response>".to_string();
    }

    let summary = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .unwrap_or_else(|| trimmed.to_string());
    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("Engine error: {collapsed}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{spawn_http_fixture, FixtureResponse};
    use std::sync::Mutex;

    fn chunk(text: &str) -> SseEvent {
        SseEvent::Chunk(CompletionChunk::text(text))
    }

    #[test]
    fn data_lines_accept_both_spacing_variants() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\
              data:{\"choices\":[{\"delta\":{\"content\":\"World\"}}]}\n\
              data:[DONE]\n",
        );
        assert_eq!(events, vec![chunk("Hello"), chunk("World"), SseEvent::Done]);
    }

    #[test]
    fn lines_split_across_reads_are_reassembled() {
        let mut decoder = SseDecoder::default();
        assert!(decoder
            .push(b"data: {\"choices\":[{\"delta\":{\"con")
            .is_empty());
        let events = decoder.push("tent\":\"¿En\"}}]}\r\n\r\n".as_bytes());
        assert_eq!(events, vec![chunk("¿En")]);
    }

    #[test]
    fn comments_and_other_fields_are_ignored() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keep-alive\nevent: message\nid: 4\n\ndata: \n");
        assert!(events.is_empty());
    }

    #[test]
    fn chunks_without_content_have_no_delta() {
        assert_eq!(
            parse_data_payload(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            Some(SseEvent::Chunk(CompletionChunk::default()))
        );
        assert_eq!(
            parse_data_payload(r#"{"choices":[]}"#),
            Some(SseEvent::Chunk(CompletionChunk::default()))
        );
    }

    #[test]
    fn error_payloads_are_summarized() {
        assert_eq!(
            parse_data_payload(r#"{"error":{"message":"model   overloaded"}}"#),
            Some(SseEvent::Error("Engine error: model overloaded".to_string()))
        );
        assert_eq!(
            describe_api_error(r#"{"error":"model 'x' not found"}"#),
            "Engine error: model 'x' not found"
        );
        assert_eq!(describe_api_error("  bad gateway \n"), "Engine error: bad gateway");
        assert_eq!(describe_api_error(""), "Engine error: <empty response>");
    }

    #[test]
    fn trailing_line_without_newline_is_flushed() {
        let mut decoder = SseDecoder::default();
        assert!(decoder
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"fin\"}}]}")
            .is_empty());
        assert_eq!(decoder.finish(), vec![chunk("fin")]);
    }

    fn engine_for(base_url: String, model: &str) -> HttpEngine {
        HttpEngine::new(HttpEngineSettings {
            base_url,
            model: model.to_string(),
            api_key: None,
            idle_timeout: Some(Duration::from_secs(5)),
        })
    }

    fn sse_body(parts: &[&str]) -> String {
        let mut body = String::new();
        for part in parts {
            let payload = serde_json::json!({"choices": [{"delta": {"content": part}}]});
            body.push_str(&format!("data: {payload}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn completion_streams_chunks_in_order() {
        let base_url = spawn_http_fixture(vec![FixtureResponse::event_stream(sse_body(&[
            "¿",
            "En",
            " qué puedo ayudarte?",
        ]))])
        .await;
        let engine = engine_for(base_url, "gemma2:2b");

        let mut stream = engine
            .create_completion(vec![Message::user("Hola")])
            .await
            .expect("stream");
        let mut parts = Vec::new();
        while let Some(item) = stream.next().await {
            parts.push(item.expect("chunk").delta().to_string());
        }
        assert_eq!(parts, vec!["¿", "En", " qué puedo ayudarte?"]);
    }

    #[tokio::test]
    async fn rejected_request_becomes_api_error() {
        let base_url = spawn_http_fixture(vec![FixtureResponse::json(
            "500 Internal Server Error",
            r#"{"error":{"message":"out of memory"}}"#,
        )])
        .await;
        let engine = engine_for(base_url, "gemma2:2b");

        let result = engine.create_completion(vec![Message::user("Hola")]).await;
        match result {
            Err(EngineError::Api(message)) => assert_eq!(message, "Engine error: out of memory"),
            Err(other) => panic!("expected api error, got {other:?}"),
            Ok(_) => panic!("expected api error, got a stream"),
        }
    }

    #[tokio::test]
    async fn mid_stream_error_ends_the_stream() {
        let body = format!(
            "{}data: {{\"error\":{{\"message\":\"lost the GPU\"}}}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n"
        );
        let base_url = spawn_http_fixture(vec![FixtureResponse::event_stream(body)]).await;
        let engine = engine_for(base_url, "gemma2:2b");

        let mut stream = engine
            .create_completion(vec![Message::user("Hola")])
            .await
            .expect("stream");
        assert_eq!(stream.next().await, Some(Ok(CompletionChunk::text("Hi"))));
        assert_eq!(
            stream.next().await,
            Some(Err(EngineError::Api("Engine error: lost the GPU".to_string())))
        );
        assert_eq!(stream.next().await, None);
    }

    fn impatient_engine(base_url: String) -> HttpEngine {
        HttpEngine::new(HttpEngineSettings {
            base_url,
            model: "gemma2:2b".to_string(),
            api_key: None,
            idle_timeout: Some(Duration::from_millis(300)),
        })
    }

    #[tokio::test]
    async fn stalled_stream_times_out_after_last_chunk() {
        let base_url = spawn_http_fixture(vec![FixtureResponse::stalled_event_stream(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        )])
        .await;
        let engine = impatient_engine(base_url);

        let mut stream = engine
            .create_completion(vec![Message::user("Hola")])
            .await
            .expect("stream");
        assert_eq!(stream.next().await, Some(Ok(CompletionChunk::text("Hi"))));
        assert_eq!(
            stream.next().await,
            Some(Err(EngineError::Timeout(Duration::from_millis(300))))
        );
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn silent_engine_times_out_before_headers() {
        let base_url = spawn_http_fixture(vec![FixtureResponse::silent()]).await;
        let engine = impatient_engine(base_url);

        match engine.create_completion(vec![Message::user("Hola")]).await {
            Err(err) => assert_eq!(err, EngineError::Timeout(Duration::from_millis(300))),
            Ok(_) => panic!("expected a timeout, got a stream"),
        }
    }

    #[tokio::test]
    async fn initialize_reports_progress_until_ready() {
        let base_url = spawn_http_fixture(vec![FixtureResponse::json(
            "200 OK",
            r#"{"data":[{"id":"gemma2:2b"},{"id":"llama3.2:latest"}]}"#,
        )])
        .await;
        let engine = engine_for(base_url, "gemma2:2b");
        let reports = Mutex::new(Vec::new());

        engine
            .initialize(&|progress| reports.lock().unwrap().push(progress))
            .await
            .expect("initialized");

        let reports = reports.into_inner().unwrap();
        let steps: Vec<f32> = reports.iter().map(|report| report.progress).collect();
        assert_eq!(steps, vec![0.0, 0.5, 1.0]);
        assert!(reports.last().unwrap().is_ready());
    }

    #[tokio::test]
    async fn initialize_fails_for_unlisted_model() {
        let base_url = spawn_http_fixture(vec![FixtureResponse::json(
            "200 OK",
            r#"{"data":[{"id":"llama3.2:latest"}]}"#,
        )])
        .await;
        let engine = engine_for(base_url, "gemma2:2b");

        let result = engine.initialize(&|_| {}).await;
        assert_eq!(
            result,
            Err(EngineError::ModelUnavailable {
                model: "gemma2:2b".to_string(),
                available: vec!["llama3.2:latest".to_string()],
            })
        );
    }
}
