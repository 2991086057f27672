//! Single-submission grading step.
//!
//! Composes the codec and launcher into one `grade` call that always returns
//! a typed `GradingOutcome`; no error crosses this boundary. Exactly one
//! launch happens per call, never a retry.

use crate::canvas::StudentIdentity;
use crate::grader::launcher::{launch, LaunchResult, LaunchSpec};
use crate::grader::protocol::{decode, DiscussionContext, GradingRequest, SubmissionRecord};
use crate::grader::GradingOutcome;
use crate::run::executor::SubmissionGrader;
use crate::shutdown::ShutdownSignal;
use tracing::{info, warn};

/// Grades submissions by running the configured external executable.
pub struct ExternalGrader {
    spec: LaunchSpec,
    shutdown: ShutdownSignal,
}

impl ExternalGrader {
    pub fn new(spec: LaunchSpec, shutdown: ShutdownSignal) -> Self {
        Self { spec, shutdown }
    }
}

impl SubmissionGrader for ExternalGrader {
    async fn grade(
        &self,
        discussion: &DiscussionContext,
        student: &StudentIdentity,
        submission: Option<&SubmissionRecord>,
    ) -> GradingOutcome {
        // No entry means no work was submitted. A content rule, not a
        // transport failure; the launcher is never invoked.
        let Some(submission) = submission else {
            return GradingOutcome::SkippedNoSubmission;
        };

        info!(login_id = %student.login_id, name = %student.name, "Grading submission");

        let request = GradingRequest {
            discussion,
            student,
            submission,
        };
        let input = request.encode();

        let result = match launch(&self.spec, &input, &self.shutdown).await {
            Ok(result) => result,
            // The executable was validated at run start; if it vanished
            // mid-run this submission fails, the run continues.
            Err(e) => {
                warn!(login_id = %student.login_id, error = %e, "Grader launch validation failed");
                return GradingOutcome::GraderFailed {
                    exit_code: -1,
                    stderr: e.to_string(),
                };
            }
        };

        match result {
            LaunchResult::Timeout => GradingOutcome::Timeout,
            LaunchResult::Interrupted => GradingOutcome::Interrupted,
            LaunchResult::ProcessError(message) => {
                warn!(login_id = %student.login_id, error = %message, "Grader process error");
                GradingOutcome::GraderFailed {
                    exit_code: -1,
                    stderr: message,
                }
            }
            LaunchResult::Completed {
                exit_code,
                stdout,
                stderr,
            } => {
                if exit_code != 0 {
                    warn!(login_id = %student.login_id, exit_code, "Grader self-reported failure");
                    return GradingOutcome::GraderFailed { exit_code, stderr };
                }
                match decode(&stdout) {
                    Ok(response) => GradingOutcome::Graded(response),
                    Err(e) => GradingOutcome::MalformedOutput {
                        raw: String::from_utf8_lossy(&stdout).into_owned(),
                        detail: e.to_string(),
                    },
                }
            }
        }
    }
}
