//! The run report: ordered outcomes and derived counts for one invocation.

use crate::canvas::StudentIdentity;
use crate::grader::GradingOutcome;
use crate::run::plan::{RunMode, Selection};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// What happened to a computed grade downstream. A publish failure never
/// invalidates the grading itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PublishStatus {
    /// Nothing to publish (the submission was not graded).
    NotApplicable,
    /// Graded in dry-run mode; would have been published in a live run.
    DryRun,
    Published,
    Failed(String),
}

/// One student's row in the report.
#[derive(Debug, Clone, Serialize)]
pub struct StudentOutcome {
    pub user_id: i64,
    pub login_id: String,
    pub student_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<i64>,
    pub outcome: GradingOutcome,
    pub publish: PublishStatus,
}

/// Summary counts, maintained on append and never recomputed by re-scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub graded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Aggregate record of one batch invocation. Owned and appended to
/// exclusively by the run executor.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub selection: Selection,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub interrupted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub counts: RunCounts,
    pub outcomes: Vec<StudentOutcome>,
}

impl RunReport {
    pub fn new(mode: RunMode, selection: Selection) -> Self {
        Self {
            mode,
            selection,
            started_at: Utc::now(),
            finished_at: None,
            interrupted: false,
            notes: Vec::new(),
            counts: RunCounts::default(),
            outcomes: Vec::new(),
        }
    }

    /// Append one outcome and keep the counts current. The interrupted marker
    /// is recorded without counting toward graded/skipped/failed.
    pub fn append(&mut self, student: &StudentIdentity, entry_id: Option<i64>, outcome: GradingOutcome, publish: PublishStatus) {
        match &outcome {
            GradingOutcome::Graded(_) => self.counts.graded += 1,
            GradingOutcome::SkippedNoSubmission => self.counts.skipped += 1,
            GradingOutcome::Interrupted => {}
            _ => self.counts.failed += 1,
        }
        self.outcomes.push(StudentOutcome {
            user_id: student.user_id,
            login_id: student.login_id.clone(),
            student_name: student.name.clone(),
            entry_id,
            outcome,
            publish,
        });
    }

    /// Stamp the end of the run. The report is complete and immutable after
    /// this.
    pub fn finalize(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Persist the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
