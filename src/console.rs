//! Console output formatting with ANSI color support.
//!
//! Provides styled terminal output with automatic TTY detection
//! and respect for the NO_COLOR environment variable.

use std::io::{self, IsTerminal};

/// ANSI style codes for terminal formatting.
#[derive(Debug, Clone, Copy)]
pub enum Style {
    Bold,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl Style {
    /// Returns the ANSI escape code for this style.
    fn code(self) -> &'static str {
        match self {
            Style::Bold => "1",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Console output handler with color support detection.
#[derive(Debug)]
pub struct Console {
    colors_enabled: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a new Console instance, detecting color support.
    ///
    /// Colors are disabled if:
    /// - The `NO_COLOR` environment variable is set
    /// - stdout is not a terminal (TTY)
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();

        Self { colors_enabled }
    }

    /// Creates a Console with colors explicitly enabled or disabled.
    pub fn with_colors(enabled: bool) -> Self {
        Self {
            colors_enabled: enabled,
        }
    }

    /// Applies ANSI styles to text if colors are enabled.
    pub fn style(&self, text: &str, styles: &[Style]) -> String {
        if !self.colors_enabled || styles.is_empty() {
            return text.to_string();
        }

        let codes: Vec<&str> = styles.iter().map(|s| s.code()).collect();
        format!("\x1b[{}m{}{}", codes.join(";"), text, RESET)
    }

    /// Creates a colored label like `[INFO]`.
    pub fn label(&self, label: &str, color: Style) -> String {
        let styled = self.style(label, &[color, Style::Bold]);
        format!("[{}]", styled)
    }

    /// Prints an info message with blue `[INFO]` label.
    pub fn info(&self, message: &str) {
        println!("{} {}", self.label("INFO", Style::Blue), message);
    }

    /// Prints a success message with green `[OK]` label.
    pub fn success(&self, message: &str) {
        println!("{} {}", self.label("OK", Style::Green), message);
    }

    /// Prints a warning message with yellow `[WARN]` label.
    pub fn warning(&self, message: &str) {
        println!("{} {}", self.label("WARN", Style::Yellow), message);
    }

    /// Prints an error message with red `[ERROR]` label.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.label("ERROR", Style::Red), message);
    }

    /// Prints a step message with cyan `[STEP]` label.
    pub fn step(&self, message: &str) {
        println!("{} {}", self.label("STEP", Style::Cyan), message);
    }

    /// Prints a section header in magenta bold.
    pub fn section(&self, message: &str) {
        println!();
        println!("{}", self.style(message, &[Style::Magenta, Style::Bold]));
    }

    /// Formats a count with styling (e.g., for chapter counts).
    pub fn count(&self, n: usize) -> String {
        self.style(&n.to_string(), &[Style::Green, Style::Bold])
    }

    /// Formats download progress like `[12/48]`.
    pub fn chapter_progress(&self, done: usize, total: usize) -> String {
        self.style(
            &format!("[{}/{}]", done, total),
            &[Style::Cyan, Style::Bold],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_disabled() {
        let console = Console::with_colors(false);
        assert_eq!(console.style("hello", &[Style::Red]), "hello");
    }

    #[test]
    fn test_style_enabled() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Red]);
        assert!(styled.contains("\x1b[31m"));
        assert!(styled.contains("hello"));
        assert!(styled.contains(RESET));
    }

    #[test]
    fn test_multiple_styles() {
        let console = Console::with_colors(true);
        let styled = console.style("hello", &[Style::Bold, Style::Red]);
        assert!(styled.contains("1;31"));
    }

    #[test]
    fn test_label() {
        let console = Console::with_colors(false);
        assert_eq!(console.label("INFO", Style::Blue), "[INFO]");
    }

    #[test]
    fn test_chapter_progress_plain() {
        let console = Console::with_colors(false);
        assert_eq!(console.chapter_progress(3, 10), "[3/10]");
    }
}
