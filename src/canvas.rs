//! Canvas platform data source: REST client and DTOs.
//!
//! The run treats Canvas as a read-only snapshot fetched once at run start
//! (topic, roster, entries) plus the grade-submission endpoint used by the
//! publisher.

mod client;
mod types;

pub use client::CanvasClient;
pub use types::{DiscussionEntry, DiscussionTopic, Student, StudentIdentity};
