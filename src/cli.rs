//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; the route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_discussion_json, format_discussion_text, format_report_json, format_report_text,
    format_roster_json, format_roster_text,
};
pub use route::RunContext;
