//! Command-line interface: argument types, command handlers and output.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Print `err` to stderr and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
