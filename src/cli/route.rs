//! CLI route: run context and command dispatch. Handlers stay thin and
//! delegate to the run and canvas domains.

use crate::canvas::{CanvasClient, StudentIdentity};
use crate::cli::parse::{Cli, Commands};
use crate::cli::presentation::{
    format_discussion_json, format_discussion_text, format_report_json, format_report_text,
    format_roster_json, format_roster_text,
};
use crate::config::{ConfigLoader, SpeedgraderConfig};
use crate::error::{ConfigError, SpeedgraderError};
use crate::grader::launcher::LaunchSpec;
use crate::run::{run_grading, GradeRunRequest};
use crate::shutdown::ShutdownSignal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Runtime context for CLI execution: resolved configuration and the shutdown
/// signal shared with the launcher and executor.
pub struct RunContext {
    config: SpeedgraderConfig,
    shutdown: ShutdownSignal,
}

impl RunContext {
    /// Build the context: load layered configuration and apply CLI credential
    /// overrides.
    pub fn new(cli: &Cli, shutdown: ShutdownSignal) -> Result<Self, SpeedgraderError> {
        let mut config = match &cli.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(Path::new("."))?,
        };
        if let Some(url) = &cli.canvas_url {
            config.canvas.base_url = Some(url.clone());
        }
        if let Some(key) = &cli.api_key {
            config.canvas.api_key = Some(key.clone());
        }
        Ok(Self { config, shutdown })
    }

    #[cfg(test)]
    pub fn with_config(config: SpeedgraderConfig, shutdown: ShutdownSignal) -> Self {
        Self { config, shutdown }
    }

    /// Execute a CLI command.
    pub async fn execute(&self, command: &Commands) -> Result<String, SpeedgraderError> {
        match command {
            Commands::Grade {
                course_id,
                discussion_id,
                grader,
                assignment_id,
                live,
                only_student,
                output,
                timeout_secs,
                working_dir,
                yes,
                format,
            } => {
                self.handle_grade(
                    *course_id,
                    *discussion_id,
                    grader,
                    *assignment_id,
                    *live,
                    only_student.as_deref(),
                    output.as_deref(),
                    *timeout_secs,
                    working_dir.as_deref(),
                    *yes,
                    format,
                )
                .await
            }
            Commands::Roster { course_id, format } => self.handle_roster(*course_id, format).await,
            Commands::Discussion {
                course_id,
                discussion_id,
                format,
            } => self.handle_discussion(*course_id, *discussion_id, format).await,
            Commands::Init { force } => self.handle_init(*force),
        }
    }

    fn canvas_client(&self) -> Result<CanvasClient, SpeedgraderError> {
        let (Some(base_url), Some(api_key)) = (
            self.config.canvas.base_url.as_deref(),
            self.config.canvas.api_key.as_deref(),
        ) else {
            return Err(ConfigError::MissingCredentials.into());
        };
        Ok(CanvasClient::new(base_url, api_key, self.config.canvas.per_page)?)
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_grade(
        &self,
        course_id: i64,
        discussion_id: i64,
        grader: &Path,
        assignment_id: Option<i64>,
        live: bool,
        only_student: Option<&str>,
        output: Option<&Path>,
        timeout_secs: Option<u64>,
        working_dir: Option<&Path>,
        yes: bool,
        format: &str,
    ) -> Result<String, SpeedgraderError> {
        let request = GradeRunRequest {
            course_id,
            discussion_id,
            assignment_id,
            live,
            only_student: only_student.map(str::to_string),
            output: output.map(Path::to_path_buf),
        };
        request.validate()?;

        let launch_spec = LaunchSpec {
            executable: grader.to_path_buf(),
            working_dir: working_dir
                .map(Path::to_path_buf)
                .or_else(|| self.config.grader.working_dir.clone()),
            timeout: Duration::from_secs(timeout_secs.unwrap_or(self.config.grader.timeout_secs)),
            kill_grace: Duration::from_secs(self.config.grader.kill_grace_secs),
        };
        launch_spec.validate().map_err(ConfigError::from)?;

        // Single-target live runs touch one student; a full live batch posts
        // grades for the whole roster and gets a confirmation prompt.
        if live && only_student.is_none() && !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Post grades to Canvas for the full roster of course {}?",
                    course_id
                ))
                .interact()
                .map_err(|e| {
                    SpeedgraderError::Config(ConfigError::Invalid(format!(
                        "Failed to get user input: {}",
                        e
                    )))
                })?;
            if !confirmed {
                return Ok("Run cancelled".to_string());
            }
        }

        let client = self.canvas_client()?;
        let report = run_grading(&client, &request, launch_spec, self.shutdown.clone()).await?;

        match format {
            "json" => format_report_json(&report),
            _ => Ok(format_report_text(&report)),
        }
    }

    async fn handle_roster(&self, course_id: i64, format: &str) -> Result<String, SpeedgraderError> {
        let client = self.canvas_client()?;
        let students = client.get_students(course_id).await?;
        let roster: Vec<StudentIdentity> =
            students.into_iter().map(StudentIdentity::from).collect();
        match format {
            "json" => format_roster_json(&roster),
            _ => Ok(format_roster_text(&roster)),
        }
    }

    async fn handle_discussion(
        &self,
        course_id: i64,
        discussion_id: i64,
        format: &str,
    ) -> Result<String, SpeedgraderError> {
        let client = self.canvas_client()?;
        let topic = client.get_discussion(course_id, discussion_id).await?;
        match format {
            "json" => format_discussion_json(&topic),
            _ => Ok(format_discussion_text(&topic)),
        }
    }

    fn handle_init(&self, force: bool) -> Result<String, SpeedgraderError> {
        let path = ConfigLoader::write_starter_config(&PathBuf::from("speedgrader.toml"), force)?;
        info!(path = %path.display(), "Wrote starter configuration");
        Ok(format!(
            "Wrote {}\nEdit it to set your Canvas URL and API key.",
            path.display()
        ))
    }
}
