//! Rendering contract for session notices and the default stderr renderer.
//!
//! `RenderSink` is what the session runner and entry point talk to, so tests
//! can capture notices without touching stderr.

use crossterm::style::{Color, Stylize};

const LABEL_NOTICE: &str = "note:";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";

/// Injectable sink for advisory and diagnostic messages.
pub trait RenderSink: Send + Sync {
    /// Advisory the user should see but that does not change the outcome.
    fn notice(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Writes labelled lines to stderr, optionally colored.
///
/// Lines start with `\r` so they stay aligned when the terminal is in raw
/// mode.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn line(&self, label: &str, color: Color, msg: &str) -> String {
        if self.color {
            format!("\r{} {msg}", label.with(color).bold())
        } else {
            format!("\r{label} {msg}")
        }
    }
}

impl RenderSink for Renderer {
    fn notice(&self, msg: &str) {
        eprintln!("{}", self.line(LABEL_NOTICE, Color::Cyan, msg));
    }

    fn warn(&self, msg: &str) {
        eprintln!("{}", self.line(LABEL_WARNING, Color::Yellow, msg));
    }

    fn error(&self, msg: &str) {
        eprintln!("{}", self.line(LABEL_ERROR, Color::Red, msg));
    }
}
