//! Batch grading run: plan, sequential execution, report.

pub mod executor;
pub mod plan;
pub mod report;

pub use executor::{CanvasGradePublisher, GradePublisher, RunExecutor, SubmissionGrader};
pub use plan::{EligibleStudent, GradeRunRequest, RunMode, RunPlan, Selection};
pub use report::{PublishStatus, RunCounts, RunReport, StudentOutcome};

use crate::canvas::{CanvasClient, StudentIdentity};
use crate::error::SpeedgraderError;
use crate::grader::launcher::LaunchSpec;
use crate::grader::protocol::DiscussionContext;
use crate::grader::ExternalGrader;
use crate::shutdown::ShutdownSignal;
use tracing::info;

/// Run a full grading batch: validate, snapshot Canvas, grade sequentially,
/// and optionally persist the report.
///
/// Configuration failures (bad mode flags, an unrunnable grader) abort here,
/// before any fetch. Per-submission failures are data in the report.
pub async fn run_grading(
    client: &CanvasClient,
    request: &GradeRunRequest,
    launch_spec: LaunchSpec,
    shutdown: ShutdownSignal,
) -> Result<RunReport, SpeedgraderError> {
    request.validate()?;
    launch_spec
        .validate()
        .map_err(crate::error::ConfigError::from)?;

    info!(
        course_id = request.course_id,
        discussion_id = request.discussion_id,
        live = request.live,
        "Starting grading run"
    );

    let topic = client
        .get_discussion(request.course_id, request.discussion_id)
        .await?;
    let students = client.get_students(request.course_id).await?;
    let roster: Vec<StudentIdentity> = students.into_iter().map(StudentIdentity::from).collect();
    let entries = client
        .get_discussion_entries(request.course_id, request.discussion_id)
        .await?;

    let discussion = DiscussionContext::from_topic(&topic);
    let run_plan = RunPlan::build(
        request.mode(),
        roster,
        &entries,
        request.only_student.as_deref(),
    );

    let grader = ExternalGrader::new(launch_spec, shutdown.clone());
    let publisher = CanvasGradePublisher::new(client, request.course_id);
    let executor = RunExecutor::new(shutdown);
    let report = executor
        .execute(
            &grader,
            &publisher,
            &discussion,
            &run_plan,
            request.assignment_id,
        )
        .await;

    if let Some(path) = &request.output {
        report.save(path)?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(report)
}
