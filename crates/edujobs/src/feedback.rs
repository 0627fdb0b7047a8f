//! Toast-style feedback on stderr.
//!
//! Success and failure notices go to stderr so stdout stays clean for
//! piping. Server-provided messages are printed verbatim.

use owo_colors::OwoColorize;

use crate::cli::GlobalOpts;
use crate::output::should_color;

/// Print a success toast unless `--quiet`.
pub fn success(global: &GlobalOpts, message: &str) {
    if global.quiet {
        return;
    }
    if should_color(&global.color) {
        eprintln!("{} {message}", "✓".green().bold());
    } else {
        eprintln!("✓ {message}");
    }
}

/// Print the server's message if it sent one, otherwise `fallback`.
pub fn success_or(global: &GlobalOpts, server_message: Option<&str>, fallback: &str) {
    success(global, server_message.unwrap_or(fallback));
}

/// Print an informational notice unless `--quiet`.
pub fn notice(global: &GlobalOpts, message: &str) {
    if global.quiet {
        return;
    }
    if should_color(&global.color) {
        eprintln!("{} {message}", "•".cyan());
    } else {
        eprintln!("• {message}");
    }
}
