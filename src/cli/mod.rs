//! Command-line interface for codeq-search.

mod commands;

pub use commands::{is_verbose, run};
