//! Integration test modules


mod config_loading;
mod grading_run;
