//! Run planning: mode flags and eligible-student selection.
//!
//! The plan fixes the processing order (roster order) before any grading
//! starts, so the report's outcome ordering is deterministic for a given
//! roster and filter.

use crate::canvas::{DiscussionEntry, StudentIdentity};
use crate::error::ConfigError;
use crate::grader::protocol::SubmissionRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Dry-run computes grades without posting; live posts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    DryRun,
    Live,
}

/// Full roster, or one student picked by login id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "login_id", rename_all = "snake_case")]
pub enum Selection {
    FullBatch,
    SingleTarget(String),
}

/// The caller-facing request for one grading run.
#[derive(Debug, Clone)]
pub struct GradeRunRequest {
    pub course_id: i64,
    pub discussion_id: i64,
    pub assignment_id: Option<i64>,
    pub live: bool,
    pub only_student: Option<String>,
    pub output: Option<PathBuf>,
}

impl GradeRunRequest {
    /// Mode-flag validation, surfaced before any fetch or processing. The
    /// single-target filter combines freely with either mode; live without an
    /// assignment id cannot post grades and is rejected here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.live && self.assignment_id.is_none() {
            return Err(ConfigError::LiveRequiresAssignment);
        }
        Ok(())
    }

    pub fn mode(&self) -> RunMode {
        if self.live {
            RunMode::Live
        } else {
            RunMode::DryRun
        }
    }

    pub fn selection(&self) -> Selection {
        match &self.only_student {
            Some(login) => Selection::SingleTarget(login.clone()),
            None => Selection::FullBatch,
        }
    }
}

/// One eligible student and their submission, if any.
#[derive(Debug, Clone)]
pub struct EligibleStudent {
    pub student: StudentIdentity,
    pub submission: Option<SubmissionRecord>,
}

/// The frozen selection for one run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub mode: RunMode,
    pub selection: Selection,
    pub students: Vec<EligibleStudent>,
    pub notes: Vec<String>,
}

impl RunPlan {
    /// Build the plan from the roster/entries snapshot.
    ///
    /// Eligible students appear in roster order. A student's submission is
    /// their first entry in the snapshot (Canvas returns entries in creation
    /// order; later entries are follow-up replies). Entries authored by
    /// anyone not on the roster, such as instructor posts, are ignored. A
    /// single-target login missing from the roster yields an empty plan with
    /// a recorded note, not an error.
    pub fn build(
        mode: RunMode,
        roster: Vec<StudentIdentity>,
        entries: &[DiscussionEntry],
        only_student: Option<&str>,
    ) -> Self {
        let selection = match only_student {
            Some(login) => Selection::SingleTarget(login.to_string()),
            None => Selection::FullBatch,
        };

        let mut first_entry: HashMap<i64, &DiscussionEntry> = HashMap::new();
        for entry in entries {
            first_entry.entry(entry.user_id).or_insert(entry);
        }

        let mut students = Vec::new();
        let mut notes = Vec::new();
        let mut target_found = false;

        for student in roster {
            if let Some(target) = only_student {
                if student.login_id != target {
                    continue;
                }
                target_found = true;
                info!(
                    login_id = %student.login_id,
                    name = %student.name,
                    "Single-target mode: only processing this student"
                );
            }
            let submission = first_entry
                .get(&student.user_id)
                .map(|entry| SubmissionRecord::from_entry(entry));
            students.push(EligibleStudent {
                student,
                submission,
            });
        }

        if let Some(target) = only_student {
            if !target_found {
                notes.push(format!(
                    "Student with login id '{}' not found in course roster",
                    target
                ));
            }
        }

        Self {
            mode,
            selection,
            students,
            notes,
        }
    }
}
