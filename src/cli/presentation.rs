//! CLI presentation: text and JSON formatters for reports, rosters, and
//! discussion topics.

use crate::canvas::{DiscussionTopic, StudentIdentity};
use crate::error::SpeedgraderError;
use crate::grader::GradingOutcome;
use crate::run::{PublishStatus, RunMode, RunReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_report_text(report: &RunReport) -> String {
    let mut out = String::new();

    match report.mode {
        RunMode::DryRun => {
            out.push_str(&format!(
                "{}\nUse --live to actually post grades and comments\n\n",
                "=== DRY RUN ===".yellow().bold()
            ));
        }
        RunMode::Live => {
            out.push_str(&format!("{}\n\n", "=== LIVE RUN ===".green().bold()));
        }
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Login", "Student", "Outcome", "Grade", "Posted"]);
    for row in &report.outcomes {
        let (outcome, grade) = match &row.outcome {
            GradingOutcome::Graded(response) => ("graded".to_string(), response.grade_text()),
            GradingOutcome::SkippedNoSubmission => ("no submission".to_string(), "-".to_string()),
            GradingOutcome::GraderFailed { exit_code, .. } => {
                (format!("grader failed (exit {})", exit_code), "-".to_string())
            }
            GradingOutcome::Timeout => ("timeout".to_string(), "-".to_string()),
            GradingOutcome::MalformedOutput { .. } => {
                ("malformed output".to_string(), "-".to_string())
            }
            GradingOutcome::Interrupted => ("interrupted".to_string(), "-".to_string()),
        };
        let posted = match &row.publish {
            PublishStatus::NotApplicable => "-".to_string(),
            PublishStatus::DryRun => "would post".to_string(),
            PublishStatus::Published => "yes".to_string(),
            PublishStatus::Failed(reason) => format!("failed: {}", reason),
        };
        table.add_row(vec![
            row.login_id.clone(),
            row.student_name.clone(),
            outcome,
            grade,
            posted,
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');

    out.push_str(&format!(
        "\nProcessed {} students: {} graded, {} without submission, {} failed\n",
        report.outcomes.len(),
        report.counts.graded.to_string().green(),
        report.counts.skipped.to_string().yellow(),
        report.counts.failed.to_string().red(),
    ));

    for note in &report.notes {
        out.push_str(&format!("Note: {}\n", note));
    }
    if report.interrupted {
        out.push_str(&format!(
            "{}\n",
            "Run was interrupted before all students were processed".red()
        ));
    }

    out
}

pub fn format_report_json(report: &RunReport) -> Result<String, SpeedgraderError> {
    serde_json::to_string_pretty(report).map_err(|e| SpeedgraderError::Io(e.into()))
}

pub fn format_roster_text(roster: &[StudentIdentity]) -> String {
    if roster.is_empty() {
        return "No students found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Login", "Name", "Email", "User ID"]);
    for student in roster {
        table.add_row(vec![
            student.login_id.clone(),
            student.name.clone(),
            student.email.clone(),
            student.user_id.to_string(),
        ]);
    }
    format!("{}\n\n{} students", table, roster.len())
}

pub fn format_roster_json(roster: &[StudentIdentity]) -> Result<String, SpeedgraderError> {
    serde_json::to_string_pretty(roster).map_err(|e| SpeedgraderError::Io(e.into()))
}

pub fn format_discussion_text(topic: &DiscussionTopic) -> String {
    let assignment = topic
        .assignment_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none (not a graded discussion)".to_string());
    format!(
        "{}\n  Discussion ID: {}\n  Assignment ID: {}\n\n{}",
        topic.title.as_deref().unwrap_or("(untitled)").bold(),
        topic.id,
        assignment,
        topic.message.as_deref().unwrap_or("(no prompt)"),
    )
}

pub fn format_discussion_json(topic: &DiscussionTopic) -> Result<String, SpeedgraderError> {
    let value = serde_json::json!({
        "id": topic.id,
        "title": topic.title,
        "prompt": topic.message,
        "assignment_id": topic.assignment_id,
    });
    serde_json::to_string_pretty(&value).map_err(|e| SpeedgraderError::Io(e.into()))
}
