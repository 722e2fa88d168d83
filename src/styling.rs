//! Terminal styling for CLI messages.
//!
//! Uses the anstyle ecosystem: `anstyle` for composable styles, `anstream`
//! for streams that respect `NO_COLOR`, `CLICOLOR_FORCE`, and terminal
//! capabilities.
//!
//! Output discipline: stdout carries machine-consumable data only (resolved
//! paths, porcelain rows, JSON); every human-directed message goes to
//! stderr.

use anstyle::{AnsiColor, Color, Style};

/// Re-exported auto-detecting stderr printer for human-directed output.
pub use anstream::eprintln;

/// Error style (red).
pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Warning style (yellow).
pub const WARNING: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Success style (green).
pub const SUCCESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

/// Hint style (dimmed).
pub const HINT: Style = Style::new().dimmed();

/// Format an operational failure: `[x] <message>`, message in red.
pub fn error_message(msg: &str) -> String {
    format!("{ERROR}[x] {msg}{ERROR:#}")
}

/// Format a warning: `[!] <message>`.
pub fn warning_message(msg: &str) -> String {
    format!("{WARNING}[!] {msg}{WARNING:#}")
}

/// Format a success line.
pub fn success_message(msg: &str) -> String {
    format!("{SUCCESS}{msg}{SUCCESS:#}")
}

/// Format a dimmed hint line.
pub fn hint_message(msg: &str) -> String {
    format!("{HINT}{msg}{HINT:#}")
}
