//! Sequential run executor.
//!
//! Processing is strictly sequential by policy, not by necessity: each grading
//! step is independent, but the Canvas API has a global rate budget shared by
//! the whole run, so submissions must not overlap. Do not replace the loop
//! with a task pool.

use crate::canvas::{CanvasClient, StudentIdentity};
use crate::error::PublishError;
use crate::grader::protocol::{DiscussionContext, SubmissionRecord};
use crate::grader::GradingOutcome;
use crate::run::plan::{RunMode, RunPlan};
use crate::run::report::{PublishStatus, RunReport};
use crate::shutdown::ShutdownSignal;
use tracing::{info, warn};

/// Seam for the single-submission grading step.
#[allow(async_fn_in_trait)]
pub trait SubmissionGrader: Send + Sync {
    async fn grade(
        &self,
        discussion: &DiscussionContext,
        student: &StudentIdentity,
        submission: Option<&SubmissionRecord>,
    ) -> GradingOutcome;
}

/// Seam for the downstream result publisher. Called at most once per
/// graded-and-live submission.
#[allow(async_fn_in_trait)]
pub trait GradePublisher: Send + Sync {
    async fn publish(
        &self,
        student: &StudentIdentity,
        assignment_id: i64,
        grade: &str,
        comment: &str,
    ) -> Result<(), PublishError>;
}

/// Publishes grades through the Canvas submissions endpoint.
pub struct CanvasGradePublisher<'a> {
    client: &'a CanvasClient,
    course_id: i64,
}

impl<'a> CanvasGradePublisher<'a> {
    pub fn new(client: &'a CanvasClient, course_id: i64) -> Self {
        Self { client, course_id }
    }
}

impl GradePublisher for CanvasGradePublisher<'_> {
    async fn publish(
        &self,
        student: &StudentIdentity,
        assignment_id: i64,
        grade: &str,
        comment: &str,
    ) -> Result<(), PublishError> {
        let comment = if comment.is_empty() {
            None
        } else {
            Some(comment)
        };
        self.client
            .submit_grade(self.course_id, assignment_id, student.user_id, grade, comment)
            .await?;
        Ok(())
    }
}

/// Drives one run: grades each eligible student in plan order, publishes
/// graded outcomes in live mode, and accumulates the report.
pub struct RunExecutor {
    shutdown: ShutdownSignal,
}

impl RunExecutor {
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self { shutdown }
    }

    pub async fn execute<G: SubmissionGrader, P: GradePublisher>(
        &self,
        grader: &G,
        publisher: &P,
        discussion: &DiscussionContext,
        plan: &RunPlan,
        assignment_id: Option<i64>,
    ) -> RunReport {
        let mut report = RunReport::new(plan.mode, plan.selection.clone());
        report.notes.extend(plan.notes.iter().cloned());

        info!(
            students = plan.students.len(),
            mode = ?plan.mode,
            "Processing run"
        );

        for eligible in &plan.students {
            // A cancellation during submission N must not start N+1.
            if self.shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }

            let outcome = grader
                .grade(discussion, &eligible.student, eligible.submission.as_ref())
                .await;
            let interrupted = matches!(outcome, GradingOutcome::Interrupted);
            info!(
                login_id = %eligible.student.login_id,
                outcome = outcome.kind(),
                "Submission processed"
            );

            let publish = match (&outcome, plan.mode, assignment_id) {
                (GradingOutcome::Graded(response), RunMode::Live, Some(assignment_id)) => {
                    match publisher
                        .publish(
                            &eligible.student,
                            assignment_id,
                            &response.grade_text(),
                            response.comment_text(),
                        )
                        .await
                    {
                        Ok(()) => PublishStatus::Published,
                        Err(e) => {
                            warn!(
                                login_id = %eligible.student.login_id,
                                error = %e,
                                "Grade computed but not recorded downstream"
                            );
                            PublishStatus::Failed(e.to_string())
                        }
                    }
                }
                (GradingOutcome::Graded(_), RunMode::Live, None) => {
                    // Validation rejects live runs without an assignment id
                    // before processing starts.
                    PublishStatus::Failed("no assignment id configured".to_string())
                }
                (GradingOutcome::Graded(_), RunMode::DryRun, _) => PublishStatus::DryRun,
                _ => PublishStatus::NotApplicable,
            };

            let entry_id = eligible.submission.as_ref().map(|s| s.entry_id);
            report.append(&eligible.student, entry_id, outcome, publish);

            if interrupted {
                report.interrupted = true;
                break;
            }
        }

        report.finalize();
        info!(
            graded = report.counts.graded,
            skipped = report.counts.skipped,
            failed = report.counts.failed,
            interrupted = report.interrupted,
            "Run complete"
        );
        report
    }
}
