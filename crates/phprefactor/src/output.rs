//! Output formatting utilities.
//!
//! Commands print results either as text or as JSON via the `OutputFormatter` trait.

use serde::Serialize;
use std::io::IsTerminal;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text, colored when stdout is a terminal.
    Text { colors: bool },
    /// JSON on stdout.
    Json,
}

impl OutputFormat {
    pub fn from_cli(json: bool) -> Self {
        if json {
            return OutputFormat::Json;
        }
        OutputFormat::Text {
            colors: use_colors(),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    pub fn use_colors(&self) -> bool {
        matches!(self, OutputFormat::Text { colors: true })
    }
}

/// Respects NO_COLOR, otherwise colors only on a TTY.
fn use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Types that can be printed as text or JSON.
pub trait OutputFormatter: Serialize {
    /// Plain text.
    fn format_text(&self) -> String;

    /// Text with colors. Falls back to `format_text()`.
    fn format_pretty(&self) -> String {
        self.format_text()
    }

    /// Print to stdout in the given format.
    fn print(&self, format: &OutputFormat) {
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default())
            }
            text if text.use_colors() => println!("{}", self.format_pretty()),
            _ => println!("{}", self.format_text()),
        }
    }
}
