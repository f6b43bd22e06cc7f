//! Core data types shared by memory backends and the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of memory store.
///
/// The declaration order is the fixed section order of a unified context.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Recent turns of the current conversation
    Recency,
    /// Documents found by similarity search
    Similarity,
    /// Long-term record of past conversations
    LongTermHistory,
    /// Procedures and their relations
    WorkflowGraph,
}

impl MemoryKind {
    /// Every kind, in section order.
    pub const ALL: [MemoryKind; 4] = [
        Self::Recency,
        Self::Similarity,
        Self::LongTermHistory,
        Self::WorkflowGraph,
    ];

    /// Stable identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Similarity => "similarity",
            Self::LongTermHistory => "long_term_history",
            Self::WorkflowGraph => "workflow_graph",
        }
    }

    /// Heading used when rendering this kind's section.
    #[must_use]
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Recency => "## Recent Conversation Context",
            Self::Similarity => "## Relevant Document Information",
            Self::LongTermHistory => "## Similar Past Conversations",
            Self::WorkflowGraph => "## Relevant Procedure",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recency" | "short_term" => Ok(Self::Recency),
            "similarity" | "semantic" => Ok(Self::Similarity),
            "long_term_history" | "episodic" => Ok(Self::LongTermHistory),
            "workflow_graph" | "procedural" => Ok(Self::WorkflowGraph),
            other => Err(format!("unknown memory kind: {other}")),
        }
    }
}

/// Record payload: plain text or a structured document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordContent {
    /// Plain text
    Text(String),
    /// Structured JSON document
    Structured(serde_json::Value),
}

impl RecordContent {
    /// Text used for matching and plain rendering.
    #[must_use]
    pub fn search_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                let mut parts = Vec::new();
                collect_strings(value, &mut parts);
                parts.join(" ")
            }
        }
    }

    /// String field of a structured document.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Structured(value) => value.get(name).and_then(serde_json::Value::as_str),
            Self::Text(_) => None,
        }
    }
}

fn collect_strings<'a>(value: &'a serde_json::Value, out: &mut Vec<&'a str>) {
    match value {
        serde_json::Value::String(s) => out.push(s),
        serde_json::Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        serde_json::Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

impl From<&str> for RecordContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RecordContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A record to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Payload
    pub content: RecordContent,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Owning conversation
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl NewRecord {
    /// Record with the given content and no metadata.
    #[must_use]
    pub fn new(content: impl Into<RecordContent>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
            conversation_id: None,
        }
    }

    /// Structured record.
    #[must_use]
    pub fn structured(value: serde_json::Value) -> Self {
        Self::new(RecordContent::Structured(value))
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach the owning conversation.
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable key, unique within one backend
    pub key: String,
    /// Payload
    pub content: RecordContent,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Owning conversation
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// First stored
    pub created_at: DateTime<Utc>,
    /// Last overwritten
    pub updated_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Materialize a new record under `key`, stamped now.
    #[must_use]
    pub fn from_new(key: impl Into<String>, entry: NewRecord) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            content: entry.content,
            metadata: entry.metadata,
            conversation_id: entry.conversation_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A search hit with backend-specific relevance in `[0.0, 1.0]`.
///
/// Relevance values are not comparable across backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryQueryResult {
    /// Matched record
    pub record: MemoryRecord,
    /// Relevance score
    pub relevance: f32,
}

impl MemoryQueryResult {
    /// Wrap a record, clamping relevance into `[0.0, 1.0]`.
    #[must_use]
    pub fn new(record: MemoryRecord, relevance: f32) -> Self {
        let relevance = if relevance.is_nan() {
            0.0
        } else {
            relevance.clamp(0.0, 1.0)
        };
        Self { record, relevance }
    }
}

/// Search hints. Backends that cannot honour a filter ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Restrict to one conversation
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl SearchFilters {
    /// Filters scoped to one conversation.
    #[must_use]
    pub fn conversation(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
        }
    }
}

/// Per-kind liveness plus an overall flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Alive flag per registered kind
    pub backends: std::collections::BTreeMap<MemoryKind, bool>,
    /// True iff at least one backend is alive
    pub overall: bool,
}
