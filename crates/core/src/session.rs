use aarogya_common::Result;
use aarogya_providers::llm::LanguageModel;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Context window for the free-text assistant: only the most recent
/// exchanges feed the prompt.
const CONTEXT_MESSAGES: usize = 10;

const DEFAULT_MAX_SESSIONS: usize = 100;

const ASSISTANT_PERSONA: &str =
    "You are a helpful assistant. Please respond to the user's message.";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    Human(String),
    Assistant(String),
}

/// Keyed memory for the free-text assistant. The intake flow never uses
/// this; its state is caller-threaded.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<ChatMessage>>;
    fn put(&self, key: &str, messages: Vec<ChatMessage>);
    fn evict_oldest(&self, n: usize);
}

/// Bounded in-memory store: once the session count passes the cap, the
/// oldest sessions are evicted in insertion order.
pub struct InMemorySessionStore {
    inner: Mutex<StoreInner>,
    max_sessions: usize,
}

struct StoreInner {
    sessions: HashMap<String, Vec<ChatMessage>>,
    order: Vec<String>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                order: Vec::new(),
            }),
            max_sessions,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<Vec<ChatMessage>> {
        self.inner.lock().unwrap().sessions.get(key).cloned()
    }

    fn put(&self, key: &str, messages: Vec<ChatMessage>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.sessions.insert(key.to_string(), messages).is_none() {
            inner.order.push(key.to_string());
        }
        if inner.sessions.len() > self.max_sessions {
            let excess = inner.sessions.len() - self.max_sessions;
            let evicted: Vec<String> = inner.order.drain(..excess).collect();
            for key in &evicted {
                inner.sessions.remove(key);
            }
            info!("evicted {} old chat sessions", evicted.len());
        }
    }

    fn evict_oldest(&self, n: usize) {
        let mut inner = self.inner.lock().unwrap();
        let n = n.min(inner.order.len());
        let evicted: Vec<String> = inner.order.drain(..n).collect();
        for key in &evicted {
            inner.sessions.remove(key);
        }
    }
}

/// Free-text chat assistant with per-session memory, separate from the
/// structured intake flow.
pub struct Assistant {
    llm: Arc<dyn LanguageModel>,
    store: Arc<dyn SessionStore>,
    // One async lock per live session: a turn is a read-modify-write on
    // the store, and concurrent turns on the same session must not
    // interleave around the model call.
    session_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

pub struct AssistantReply {
    pub session_id: String,
    pub response: String,
}

impl Assistant {
    pub fn new(llm: Arc<dyn LanguageModel>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            llm,
            store,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn chat(&self, session_id: Option<&str>, message: &str) -> Result<AssistantReply> {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let lock = self.session_lock(&session_id);
        let _turn = lock.lock().await;

        let mut history = self.store.get(&session_id).unwrap_or_default();
        let prompt = build_prompt(&history, message);
        debug!("assist turn for session {}", session_id);

        let response = self.llm.complete(&prompt).await?;

        history.push(ChatMessage::Human(message.to_string()));
        history.push(ChatMessage::Assistant(response.clone()));
        self.store.put(&session_id, history);

        Ok(AssistantReply {
            session_id,
            response,
        })
    }

    fn session_lock(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.session_locks.lock().unwrap();
        // An idle lock has no holder besides the map itself; shed those
        // once the map outgrows the session cap.
        if locks.len() > DEFAULT_MAX_SESSIONS * 2 {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(session_id.to_string()).or_default().clone()
    }
}

fn build_prompt(history: &[ChatMessage], message: &str) -> String {
    let mut parts = vec![ASSISTANT_PERSONA.to_string()];
    let start = history.len().saturating_sub(CONTEXT_MESSAGES);
    for entry in &history[start..] {
        match entry {
            ChatMessage::Human(content) => parts.push(format!("Human: {content}")),
            ChatMessage::Assistant(content) => parts.push(format!("Assistant: {content}")),
        }
    }
    parts.push(format!("Human: {message}"));
    parts.join("\n")
}
