//! End-to-end grading runs: real grader scripts through the plan, step, and
//! executor.

use super::test_utils::{discussion, entry, spec_for, student, write_script};
use speedgrader::canvas::StudentIdentity;
use speedgrader::error::PublishError;
use speedgrader::grader::launcher::LaunchSpec;
use speedgrader::grader::{ExternalGrader, GradingOutcome};
use speedgrader::run::{
    GradePublisher, PublishStatus, RunExecutor, RunMode, RunPlan,
};
use speedgrader::shutdown;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

struct RecordingPublisher {
    calls: Mutex<Vec<(i64, i64, String, String)>>,
}

impl RecordingPublisher {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl GradePublisher for RecordingPublisher {
    async fn publish(
        &self,
        student: &StudentIdentity,
        assignment_id: i64,
        grade: &str,
        comment: &str,
    ) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push((
            student.user_id,
            assignment_id,
            grade.to_string(),
            comment.to_string(),
        ));
        Ok(())
    }
}

fn roster_of_five() -> Vec<StudentIdentity> {
    vec![
        student(1, "ada.l"),
        student(2, "ben.k"),
        student(3, "cleo.v"),
        student(4, "sleepy.d"),
        student(5, "eva.m"),
    ]
}

/// Entries for everyone except cleo.v (user 3).
fn entries_minus_cleo() -> Vec<speedgrader::canvas::DiscussionEntry> {
    vec![
        entry(10, 1, "isolation is about failure domains"),
        entry(11, 2, "processes share nothing by default"),
        entry(13, 4, "containers are just namespaces"),
        entry(14, 5, "the kernel enforces the boundary"),
    ]
}

#[tokio::test]
async fn live_run_grades_skips_times_out_and_publishes() {
    let dir = tempdir().unwrap();
    // sleeps only for the student whose login contains "sleepy"
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"input=$(cat)
case "$input" in
  *sleepy*) sleep 30 ;;
esac
echo '{"grade": "88", "comment": "good work"}'"#,
    );
    let spec = LaunchSpec {
        timeout: Duration::from_secs(1),
        kill_grace: Duration::from_millis(200),
        ..spec_for(script)
    };
    let (_handle, signal) = shutdown::channel();

    let plan = RunPlan::build(RunMode::Live, roster_of_five(), &entries_minus_cleo(), None);
    let grader = ExternalGrader::new(spec, signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, Some(77))
        .await;

    assert_eq!(report.counts.graded, 3);
    assert_eq!(report.counts.skipped, 1);
    assert_eq!(report.counts.failed, 1);

    let cleo = report.outcomes.iter().find(|o| o.login_id == "cleo.v").unwrap();
    assert_eq!(cleo.outcome, GradingOutcome::SkippedNoSubmission);
    let sleepy = report
        .outcomes
        .iter()
        .find(|o| o.login_id == "sleepy.d")
        .unwrap();
    assert_eq!(sleepy.outcome, GradingOutcome::Timeout);

    let calls = publisher.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(_, aid, grade, comment)| {
        *aid == 77 && grade == "88" && comment == "good work"
    }));
}

#[tokio::test]
async fn dry_run_records_what_would_have_happened_without_publishing() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"cat > /dev/null
echo '{"grade": "B+", "points": 88, "metrics": {"word_count": 5}}'"#,
    );
    let (_handle, signal) = shutdown::channel();

    let plan = RunPlan::build(
        RunMode::DryRun,
        roster_of_five(),
        &entries_minus_cleo(),
        None,
    );
    let grader = ExternalGrader::new(spec_for(script), signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, Some(77))
        .await;

    assert!(publisher.calls.lock().unwrap().is_empty());
    assert_eq!(report.counts.graded, 4);
    for row in report.outcomes.iter().filter(|o| o.login_id != "cleo.v") {
        assert_eq!(row.publish, PublishStatus::DryRun);
        // extra grader fields survive as opaque metadata
        match &row.outcome {
            GradingOutcome::Graded(response) => {
                assert_eq!(response.extra["points"], 88);
            }
            other => panic!("expected Graded, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn non_json_grader_output_is_malformed_not_graded() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"cat > /dev/null
echo 'grade: A+ (looks great!)'"#,
    );
    let (_handle, signal) = shutdown::channel();

    let plan = RunPlan::build(
        RunMode::DryRun,
        vec![student(1, "ada.l")],
        &[entry(10, 1, "a post")],
        None,
    );
    let grader = ExternalGrader::new(spec_for(script), signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, None)
        .await;

    assert_eq!(report.counts.failed, 1);
    match &report.outcomes[0].outcome {
        GradingOutcome::MalformedOutput { raw, .. } => {
            assert!(raw.contains("looks great"));
        }
        other => panic!("expected MalformedOutput, got {:?}", other),
    }
}

#[tokio::test]
async fn grader_sees_the_full_request_payload() {
    let dir = tempdir().unwrap();
    // echoes the request back as the comment-free grade, proving the payload
    // reached the child intact
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"input=$(cat)
case "$input" in
  *"isolation is about failure domains"*) echo '{"grade": "payload-ok"}' ;;
  *) echo '{"grade": "payload-missing"}' ;;
esac"#,
    );
    let (_handle, signal) = shutdown::channel();

    let plan = RunPlan::build(
        RunMode::DryRun,
        vec![student(1, "ada.l")],
        &[entry(10, 1, "isolation is about failure domains")],
        None,
    );
    let grader = ExternalGrader::new(spec_for(script), signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, None)
        .await;

    match &report.outcomes[0].outcome {
        GradingOutcome::Graded(response) => assert_eq!(response.grade_text(), "payload-ok"),
        other => panic!("expected Graded, got {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_before_run_yields_empty_interrupted_report() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"cat > /dev/null
echo '{"grade": "1"}'"#,
    );
    let (handle, signal) = shutdown::channel();
    handle.trigger();

    let plan = RunPlan::build(
        RunMode::DryRun,
        roster_of_five(),
        &entries_minus_cleo(),
        None,
    );
    let grader = ExternalGrader::new(spec_for(script), signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, None)
        .await;

    assert!(report.interrupted);
    assert!(report.outcomes.is_empty());
    assert!(publisher.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn single_target_run_processes_exactly_one_student() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"cat > /dev/null
echo '{"grade": "92"}'"#,
    );
    let (_handle, signal) = shutdown::channel();

    let plan = RunPlan::build(
        RunMode::Live,
        roster_of_five(),
        &entries_minus_cleo(),
        Some("ben.k"),
    );
    let grader = ExternalGrader::new(spec_for(script), signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, Some(77))
        .await;

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].login_id, "ben.k");
    assert_eq!(publisher.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_single_target_yields_note_not_crash() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "grader.sh",
        r#"cat > /dev/null
echo '{"grade": "92"}'"#,
    );
    let (_handle, signal) = shutdown::channel();

    let plan = RunPlan::build(
        RunMode::DryRun,
        roster_of_five(),
        &entries_minus_cleo(),
        Some("nobody.z"),
    );
    let grader = ExternalGrader::new(spec_for(script), signal.clone());
    let publisher = RecordingPublisher::new();
    let executor = RunExecutor::new(signal);

    let report = executor
        .execute(&grader, &publisher, &discussion(), &plan, None)
        .await;

    assert!(report.outcomes.is_empty());
    assert_eq!(report.notes.len(), 1);
    assert!(report.notes[0].contains("nobody.z"));
}
