//! External grader: process launcher, wire protocol, and the
//! single-submission grading step.

pub mod launcher;
pub mod protocol;
pub mod step;

pub use launcher::{launch, LaunchResult, LaunchSpec};
pub use protocol::{decode, DiscussionContext, GradingRequest, GradingResponse, SubmissionRecord};
pub use step::ExternalGrader;

use serde::Serialize;

/// The terminal, typed result of attempting to grade one submission. Every
/// failure mode below the orchestrator is converted into one of these; nothing
/// unwinds past the grading step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradingOutcome {
    /// The grader produced a response that passed codec validation.
    Graded(GradingResponse),
    /// The student never posted; the grader is not invoked.
    SkippedNoSubmission,
    /// The grader exited non-zero, or the process could not be run.
    GraderFailed { exit_code: i32, stderr: String },
    /// The grader exceeded its per-submission time budget and was killed.
    Timeout,
    /// The grader exited zero but its stdout was not a valid response.
    MalformedOutput { raw: String, detail: String },
    /// An operator shutdown arrived while this submission was in flight.
    Interrupted,
}

impl GradingOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            GradingOutcome::Graded(_) => "graded",
            GradingOutcome::SkippedNoSubmission => "no_submission",
            GradingOutcome::GraderFailed { .. } => "grader_failed",
            GradingOutcome::Timeout => "timeout",
            GradingOutcome::MalformedOutput { .. } => "malformed_output",
            GradingOutcome::Interrupted => "interrupted",
        }
    }

    /// Transport failures: recorded, never fatal, processing continues.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            GradingOutcome::GraderFailed { .. }
                | GradingOutcome::Timeout
                | GradingOutcome::MalformedOutput { .. }
        )
    }
}
