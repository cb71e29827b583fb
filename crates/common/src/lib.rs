use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// Intake template: a progressively filled patient record. The shape is
// free-form JSON so the language model can extend arrays and nested
// objects, but the key set present at creation is never allowed to
// shrink (see `restore_missing_keys`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntakeTemplate(pub Value);

impl IntakeTemplate {
    /// The empty template every conversation starts from. All leaves are
    /// placeholders that the updater replaces as information arrives.
    pub fn initial() -> Self {
        Self(json!({
            "name": "string",
            "age": "number",
            "symptoms": [
                {
                    "symptom": "string",
                    "onset": "string",
                    "severity": "string"
                }
            ],
            "medical_history": {
                "conditions": ["string"],
                "allergies": ["string"]
            }
        }))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Reinstates every key present in `previous` that the updated value
    /// lost, recursively for nested objects. Keys are only ever filled in
    /// or left as placeholders, never removed.
    pub fn restore_missing_keys(&mut self, previous: &IntakeTemplate) {
        restore_keys(&mut self.0, &previous.0);
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

fn restore_keys(current: &mut Value, previous: &Value) {
    let (Value::Object(cur), Value::Object(prev)) = (current, previous) else {
        return;
    };
    for (key, prev_value) in prev {
        match cur.get_mut(key) {
            Some(cur_value) => restore_keys(cur_value, prev_value),
            None => {
                cur.insert(key.clone(), prev_value.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    SystemQuestion,
    UserAnswer,
    SystemMessage,
}

/// One exchange in the conversation log. Order is chronological and
/// load-bearing: it feeds LLM context windows and the question counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationEntry {
    pub fn question(content: impl Into<String>) -> Self {
        Self::new(EntryKind::SystemQuestion, content)
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self::new(EntryKind::UserAnswer, content)
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self::new(EntryKind::SystemMessage, content)
    }

    fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Some(Utc::now()),
        }
    }
}

/// The caller-threaded conversation state: one template, one ordered
/// history. The server holds no copy between turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub template: IntakeTemplate,
    #[serde(default)]
    pub history: Vec<ConversationEntry>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            template: IntakeTemplate::initial(),
            history: Vec::new(),
        }
    }

    pub fn questions_asked(&self) -> usize {
        self.history
            .iter()
            .filter(|e| e.kind == EntryKind::SystemQuestion)
            .count()
    }

    /// Appends the user's answer unless the trailing entry is already
    /// this exact answer (duplicate request guard).
    pub fn push_answer(&mut self, answer: &str) -> bool {
        let duplicate = self
            .history
            .last()
            .map(|e| e.kind == EntryKind::UserAnswer && e.content == answer)
            .unwrap_or(false);
        if !duplicate {
            self.history.push(ConversationEntry::answer(answer));
        }
        !duplicate
    }

    pub fn last_entries(&self, n: usize) -> &[ConversationEntry] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// One-time summary of a completed conversation. Immutable once derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
}

// Error taxonomy shared by every crate. Adapters convert provider
// failures into `Adapter`; nothing crosses an adapter boundary as a
// panic or provider-specific error.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid request: {0}")]
    ClientInput(String),

    #[error("provider error: {0}")]
    Adapter(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, IntakeError>;

/// English needs no translation round trip.
pub fn is_english(language: &str) -> bool {
    matches!(language.trim().to_ascii_lowercase().as_str(), "english" | "en")
}
