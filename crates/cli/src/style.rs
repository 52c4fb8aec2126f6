//! Shared styling utilities for the CLI.

use console::Style;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Marker for a file new to the destination (green).
pub fn added() -> String {
    Style::new().green().apply_to("New!").to_string()
}

/// Marker for a file that differs from the destination (yellow).
pub fn modified() -> String {
    Style::new().yellow().apply_to("Modified!").to_string()
}

/// A diff line styled by its leading character.
pub fn diff_line(line: &str) -> String {
    if line.starts_with('+') && !line.starts_with("+++") {
        Style::new().green().apply_to(line).to_string()
    } else if line.starts_with('-') && !line.starts_with("---") {
        Style::new().red().apply_to(line).to_string()
    } else {
        line.to_string()
    }
}
