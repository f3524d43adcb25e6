//! Spinner shown while slow collaborators (model download, weight loading)
//! come up. Draws to stderr so stdout stays clean for command output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner with a message.
///
/// A hidden spinner is returned when `visible` is false, so callers never
/// branch on it.
pub fn create_spinner(message: impl Into<String>, visible: bool) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if !visible {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    }
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.set_message(message.into());
    if visible {
        spinner.enable_steady_tick(Duration::from_millis(80));
    }
    spinner
}
