//! CLI parse: clap types for speedgrader. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Speedgrader CLI - batch grading for Canvas graded discussions
#[derive(Parser)]
#[command(name = "speedgrader")]
#[command(about = "Grade Canvas discussion submissions via an external grader process")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Canvas instance URL (overrides config/environment)
    #[arg(long, global = true)]
    pub canvas_url: Option<String>,

    /// Canvas API key (overrides config/environment)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Grade a discussion's submissions with an external grader
    Grade {
        /// Canvas course ID
        #[arg(long)]
        course_id: i64,

        /// Canvas discussion topic ID
        #[arg(long)]
        discussion_id: i64,

        /// Path to the external grading executable
        #[arg(long)]
        grader: PathBuf,

        /// Assignment ID backing the graded discussion (required for --live)
        #[arg(long)]
        assignment_id: Option<i64>,

        /// Actually post grades and comments (default is dry run)
        #[arg(long)]
        live: bool,

        /// Only process one student, by login ID
        #[arg(long)]
        only_student: Option<String>,

        /// Write the run report to this file (JSON)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Per-submission grader timeout in seconds (overrides config)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Working directory to run the grader in (overrides config)
        #[arg(long)]
        working_dir: Option<PathBuf>,

        /// Skip the confirmation prompt for live full-batch runs
        #[arg(long)]
        yes: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the course roster with login IDs
    Roster {
        /// Canvas course ID
        #[arg(long)]
        course_id: i64,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show a discussion topic's title, prompt, and assignment ID
    Discussion {
        /// Canvas course ID
        #[arg(long)]
        course_id: i64,

        /// Canvas discussion topic ID
        #[arg(long)]
        discussion_id: i64,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write a starter speedgrader.toml in the current directory
    Init {
        /// Overwrite an existing speedgrader.toml
        #[arg(long)]
        force: bool,
    },
}
