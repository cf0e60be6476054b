//! One-line status messages.

use owo_colors::OwoColorize;

pub fn error(message: &str) -> String {
    format!("{} {}", "Error:".red().bold(), message)
}

pub fn success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}

pub fn info(message: &str) -> String {
    format!("{} {}", "ℹ".blue(), message)
}

pub fn warning(message: &str) -> String {
    format!("{} {}", "!".yellow().bold(), message)
}

/// Section heading (bold, underlined).
pub fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}
