//! Speedgrader: batch grading for Canvas graded discussions.
//!
//! Fetches a discussion's submissions and course roster, pipes each
//! submission through an external grader process over a JSON stdin/stdout
//! protocol, and posts grades back to Canvas in live mode. Submissions are
//! processed strictly sequentially to respect the Canvas API's rate budget.

pub mod canvas;
pub mod cli;
pub mod config;
pub mod error;
pub mod grader;
pub mod logging;
pub mod run;
pub mod shutdown;
