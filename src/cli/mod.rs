//! Command-line interface for rosterload.

mod commands;

pub use commands::{is_verbose, run};
