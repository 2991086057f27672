//! Error types for the speedgrader grading pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Pre-spawn validation failures for the external grader executable.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Grader executable not found: {0}")]
    NotFound(PathBuf),

    #[error("Grader executable is not executable: {0}")]
    NotExecutable(PathBuf),

    #[error("Grader working directory is not a readable directory: {0}")]
    InvalidWorkingDirectory(PathBuf),
}

/// Failures decoding the grader's stdout payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Grader output is not well-formed JSON: {0}")]
    NotWellFormed(String),

    #[error("Grader output missing required '{0}' field")]
    MissingRequiredField(String),
}

/// Canvas API failures.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Canvas authentication failed: {0}")]
    AuthFailed(String),

    #[error("Canvas resource not found: {0}")]
    NotFound(String),

    #[error("Canvas rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Canvas request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Canvas request failed: {0}")]
    Request(String),

    #[error("Invalid Canvas response: {0}")]
    Json(String),
}

/// A grade submission failure. Recorded against the submission's outcome;
/// never fatal to the run.
#[derive(Debug, Error)]
#[error("Failed to post grade: {0}")]
pub struct PublishError(#[from] pub CanvasError);

/// Configuration errors: fatal, reported before any submission is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Canvas URL and API key are required.\n\
         Set them via --canvas-url and --api-key arguments, or\n\
         set CANVAS_URL and CANVAS_API_KEY environment variables, or\n\
         run `speedgrader init` and edit speedgrader.toml"
    )]
    MissingCredentials,

    #[error("--live requires --assignment-id so grades can be posted")]
    LiveRequiresAssignment,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grader(#[from] LaunchError),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Top-level error surface for the CLI binary.
#[derive(Debug, Error)]
pub enum SpeedgraderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LaunchError> for SpeedgraderError {
    fn from(err: LaunchError) -> Self {
        SpeedgraderError::Config(ConfigError::Grader(err))
    }
}
