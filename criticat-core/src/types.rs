//! Core domain types for criticat
//!
//! These types describe exported chat transcripts and the tables computed
//! from them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Practice** | A course assignment, identified by a single letter (`A`, `B`, ...) |
//! | **Student** | The student who ran the conversation, identified by the digits after the practice letter |
//! | **Conversation** | One student's chat for one practice; a corpus folder such as `A07` |
//! | **Message** | One history entry with a role, text parts and visibility flags |
//! | **In-scope message** | A message that is both `visible` and part of the `conversation` |
//!
//! Roles follow the chat history format: `user` is the student, `model` is
//! the AI tutor.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================
// Messages
// ============================================

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The student
    User,
    /// The AI tutor
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    /// Label used in exported dialogues.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "STUDENT",
            Role::Model => "AI",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A single chat history entry as persisted by the web UI.
///
/// Fields are kept as raw JSON values: the history store is loosely typed
/// and the metrics must not reject a transcript because a flag was written
/// as `1` or a part as an object. Use the accessor methods to interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: serde_json::Value,
    #[serde(default)]
    pub parts: serde_json::Value,
    #[serde(default)]
    pub visible: serde_json::Value,
    #[serde(default)]
    pub conversation: serde_json::Value,
    /// Any other keys written by the history store
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Build an in-scope message with a single text part.
    pub fn new(role: Role, text: &str) -> Self {
        Self {
            role: role.as_str().into(),
            parts: serde_json::json!([text]),
            visible: true.into(),
            conversation: true.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Builder-style setter for the `visible` flag.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible.into();
        self
    }

    /// Builder-style setter for the `conversation` flag.
    pub fn with_conversation(mut self, conversation: bool) -> Self {
        self.conversation = conversation.into();
        self
    }

    /// Raw role string, if the role is a string at all.
    pub fn role_str(&self) -> Option<&str> {
        self.role.as_str()
    }

    /// Parsed role; `None` for anything other than `user` or `model`.
    pub fn role(&self) -> Option<Role> {
        self.role_str().and_then(|r| r.parse().ok())
    }

    pub fn is_visible(&self) -> bool {
        truthy(&self.visible)
    }

    pub fn is_conversation(&self) -> bool {
        truthy(&self.conversation)
    }
}

/// JSON truthiness: null, false, 0, "", [] and {} are false.
pub fn truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ============================================
// Conversations
// ============================================

/// Identifiers decoded from a conversation folder name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationIds {
    pub practice_id: String,
    pub student_id: String,
    pub conversation_id: String,
}

impl ConversationIds {
    /// Decompose a folder name such as `A07` into practice `A`, student `07`.
    ///
    /// The first character is the practice code whatever it is. An empty
    /// name gives empty identifiers.
    pub fn from_folder_name(name: &str) -> Self {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => Self {
                practice_id: first.to_string(),
                student_id: chars.as_str().to_string(),
                conversation_id: name.to_string(),
            },
            None => Self::default(),
        }
    }

    /// Whether the practice code follows the `<letter><digits>` convention.
    pub fn has_conventional_practice(&self) -> bool {
        self.practice_id
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
    }
}

/// A loaded conversation: its identifiers plus its ordered messages.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub ids: ConversationIds,
    pub messages: Vec<Message>,
}

// ============================================
// Metric values and tables
// ============================================

/// Value produced by a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integral count (turns, messages, questions)
    Count(i64),
    /// Real-valued score, possibly NaN
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Count(n) => *n as f64,
            MetricValue::Float(f) => *f,
        }
    }
}

impl From<usize> for MetricValue {
    fn from(n: usize) -> Self {
        MetricValue::Count(n as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(f: f64) -> Self {
        MetricValue::Float(f)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Render a float the way the research tables expect: `1.5`, `3.0`, `nan`.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// One long-format row: a single metric for a single conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub student_id: String,
    pub practice_id: String,
    pub conversation_id: String,
    pub metric_name: String,
    pub metric_value: MetricValue,
}

impl MetricRow {
    pub fn new(ids: &ConversationIds, metric_name: &str, metric_value: MetricValue) -> Self {
        Self {
            student_id: ids.student_id.clone(),
            practice_id: ids.practice_id.clone(),
            conversation_id: ids.conversation_id.clone(),
            metric_name: metric_name.to_string(),
            metric_value,
        }
    }
}

/// Summary statistics for one (practice, metric) group.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub practice_id: String,
    pub metric_name: String,
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}
