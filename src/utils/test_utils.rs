use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::core::app::{App, AppSettings, EngineStatus};
use crate::core::engine::{
    ChatEngine, CompletionChunk, CompletionStream, EngineError, InitProgress,
};
use crate::core::manager::SessionManager;
use crate::core::message::Message;
use crate::core::store::{KeyValueStore, MemoryStore, StoreError};

/// How the fake engine answers one completion request.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Chunks(Vec<&'static str>),
    /// Yields the chunks, then fails.
    FailAfter(Vec<&'static str>, EngineError),
    /// Refuses to start the stream at all.
    Reject(EngineError),
}

/// In-process [`ChatEngine`] that replays canned progress and replies.
pub struct ScriptedEngine {
    progress: Vec<InitProgress>,
    init_error: Option<EngineError>,
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            progress: vec![
                InitProgress::new(0.3, "Fetching weights"),
                InitProgress::new(1.0, "Ready"),
            ],
            init_error: None,
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_init(error: EngineError) -> Self {
        Self {
            progress: vec![InitProgress::new(0.1, "Fetching weights")],
            init_error: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Message lists received by `create_completion`, in call order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatEngine for ScriptedEngine {
    async fn initialize(
        &self,
        on_progress: &(dyn Fn(InitProgress) + Send + Sync),
    ) -> Result<(), EngineError> {
        for report in &self.progress {
            on_progress(report.clone());
        }
        match &self.init_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn create_completion(
        &self,
        messages: Vec<Message>,
    ) -> Result<CompletionStream, EngineError> {
        self.requests.lock().unwrap().push(messages);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedReply::Chunks(Vec::new()));

        let items: Vec<Result<CompletionChunk, EngineError>> = match reply {
            ScriptedReply::Chunks(parts) => parts
                .into_iter()
                .map(|part| Ok(CompletionChunk::text(part)))
                .collect(),
            ScriptedReply::FailAfter(parts, err) => parts
                .into_iter()
                .map(|part| Ok(CompletionChunk::text(part)))
                .chain(std::iter::once(Err(err)))
                .collect(),
            ScriptedReply::Reject(err) => return Err(err),
        };
        Ok(stream::iter(items).boxed())
    }
}

pub fn test_settings() -> AppSettings {
    AppSettings {
        model: "test-model".to_string(),
        greeting: true,
    }
}

/// App over an empty in-memory store with the engine still loading.
pub fn create_loading_app() -> App {
    let chats = SessionManager::open(Box::new(MemoryStore::new()), false).unwrap();
    App::new(chats, test_settings())
}

/// App over `store` with the engine ready and no greeting shown.
pub fn create_test_app_with(store: MemoryStore) -> App {
    let chats = SessionManager::open(Box::new(store), false).unwrap();
    let mut app = App::new(chats, test_settings());
    app.engine = EngineStatus::Ready;
    app
}

pub fn create_test_app() -> App {
    create_test_app_with(MemoryStore::new())
}

/// [`MemoryStore`] that refuses to write or remove the listed keys.
#[derive(Debug, Default)]
pub struct RejectingStore {
    pub inner: MemoryStore,
    pub reject_set: Vec<&'static str>,
    pub reject_remove: Vec<&'static str>,
}

impl KeyValueStore for RejectingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.reject_set.contains(&key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.reject_remove.contains(&key) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }
}

/// One canned HTTP response for [`spawn_http_fixture`].
pub struct FixtureResponse {
    status: &'static str,
    content_type: &'static str,
    body: String,
    stall: Stall,
}

/// Where a fixture response stops sending while keeping the connection open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stall {
    Never,
    BeforeHeaders,
    AfterBody,
}

impl FixtureResponse {
    pub fn event_stream(body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            content_type: "text/event-stream",
            body: body.into(),
            stall: Stall::Never,
        }
    }

    /// Sends the headers and `body`, then goes quiet without closing.
    pub fn stalled_event_stream(body: impl Into<String>) -> Self {
        Self {
            stall: Stall::AfterBody,
            ..Self::event_stream(body)
        }
    }

    /// Accepts the request and never answers.
    pub fn silent() -> Self {
        Self {
            stall: Stall::BeforeHeaders,
            ..Self::event_stream("")
        }
    }

    pub fn json(status: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
            stall: Stall::Never,
        }
    }
}

/// Serves `responses` to successive connections on a loopback port and
/// returns the base URL to reach them.
pub async fn spawn_http_fixture(responses: Vec<FixtureResponse>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            read_request(&mut socket).await;
            if response.stall == Stall::BeforeHeaders {
                wait_for_client_close(&mut socket).await;
                continue;
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
                response.status, response.content_type
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(response.body.as_bytes()).await;
            let _ = socket.flush().await;
            if response.stall == Stall::AfterBody {
                wait_for_client_close(&mut socket).await;
                continue;
            }
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}/v1")
}

async fn wait_for_client_close(socket: &mut tokio::net::TcpStream) {
    let mut buf = [0u8; 256];
    while let Ok(read) = socket.read(&mut buf).await {
        if read == 0 {
            return;
        }
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let Ok(read) = socket.read(&mut buf).await else {
            return;
        };
        if read == 0 {
            return;
        }
        request.extend_from_slice(&buf[..read]);
        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if request.len() >= header_end + 4 + content_length {
            return;
        }
    }
}
