//! Grading wire protocol.
//!
//! The grader receives one pretty-printed JSON request on stdin and answers
//! with one JSON object on stdout. The request carries discussion context,
//! student identity, and the submission. The response must carry a `grade`
//! field; `comment` is optional; any other fields are preserved as opaque
//! metadata so richer graders keep working.

use crate::canvas::{DiscussionEntry, DiscussionTopic, StudentIdentity};
use crate::error::DecodeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discussion fields forwarded to the grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionContext {
    pub id: i64,
    pub title: String,
    pub prompt: String,
}

impl DiscussionContext {
    pub fn from_topic(topic: &DiscussionTopic) -> Self {
        Self {
            id: topic.id,
            title: topic.title.clone().unwrap_or_default(),
            prompt: topic.message.clone().unwrap_or_default(),
        }
    }
}

/// One student's work, immutable once built from a discussion entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub entry_id: i64,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub word_count: usize,
}

impl SubmissionRecord {
    pub fn from_entry(entry: &DiscussionEntry) -> Self {
        Self {
            entry_id: entry.id,
            message: entry.message.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            word_count: entry.message.split_whitespace().count(),
        }
    }
}

/// The request payload written to the grader's stdin. Constructed fresh per
/// submission.
#[derive(Debug, Serialize)]
pub struct GradingRequest<'a> {
    pub discussion: &'a DiscussionContext,
    pub student: &'a StudentIdentity,
    pub submission: &'a SubmissionRecord,
}

impl GradingRequest<'_> {
    /// Encoding is total: serde_json escapes control characters and non-ASCII
    /// text, and these types contain nothing that can fail to serialize.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(self).expect("grading request serialization is infallible")
    }
}

/// The grader's response. The grade value stays opaque at this layer; its
/// scale and format belong to the grader and the publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResponse {
    pub grade: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GradingResponse {
    /// Render the grade for posting: strings pass through, everything else is
    /// its JSON rendering.
    pub fn grade_text(&self) -> String {
        match &self.grade {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }
}

/// Parse and validate the grader's stdout.
pub fn decode(bytes: &[u8]) -> Result<GradingResponse, DecodeError> {
    let text = String::from_utf8_lossy(bytes);
    let value: serde_json::Value = serde_json::from_str(text.trim())
        .map_err(|e| DecodeError::NotWellFormed(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::NotWellFormed("expected a JSON object".to_string()))?;

    match object.get("grade") {
        None | Some(serde_json::Value::Null) => {
            return Err(DecodeError::MissingRequiredField("grade".to_string()));
        }
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
            return Err(DecodeError::MissingRequiredField("grade".to_string()));
        }
        Some(_) => {}
    }

    serde_json::from_value(value).map_err(|e| DecodeError::NotWellFormed(e.to_string()))
}
