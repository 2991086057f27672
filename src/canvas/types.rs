//! Canvas API DTOs and the normalized student identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student as returned by `GET /courses/{id}/students`.
#[derive(Debug, Clone, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sortable_name: Option<String>,
}

/// Normalized identity fields carried into the grader payload and the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub user_id: i64,
    pub name: String,
    pub login_id: String,
    pub email: String,
    pub sortable_name: String,
}

impl From<Student> for StudentIdentity {
    fn from(student: Student) -> Self {
        let sortable_name = student
            .sortable_name
            .unwrap_or_else(|| student.name.clone());
        Self {
            user_id: student.id,
            name: student.name,
            login_id: student.login_id.unwrap_or_else(|| "unknown".to_string()),
            email: student.email.unwrap_or_default(),
            sortable_name,
        }
    }
}

/// A discussion topic as returned by
/// `GET /courses/{id}/discussion_topics/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionTopic {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    /// The discussion prompt body.
    #[serde(default)]
    pub message: Option<String>,
    /// Present when the discussion is graded.
    #[serde(default)]
    pub assignment_id: Option<i64>,
}

/// One post in a discussion.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionEntry {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
