//! Output rendering for the chat.
//!
//! The session and the loop never write to the terminal directly; they go
//! through [`Renderer`] so that output can be styled, redirected, or
//! captured.

use std::env;
use std::io::{self, IsTerminal, Stdout, Write};

/// ANSI escape code for dim text (used for notices).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the reply label).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the reply label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label printed in front of every model reply.
pub const MODEL_LABEL: &str = "Gemini";

/// Trait for rendering chat output.
///
/// A reply is rendered as `start_response`, zero or more `print_text` calls
/// in arrival order, then `finish_response`.
pub trait Renderer: Send {
    /// Called once the service has accepted a turn, before any fragment.
    fn start_response(&mut self) -> io::Result<()>;

    /// Print one fragment of the reply.
    ///
    /// This is called incrementally as fragments are streamed from the API
    /// and must reach the terminal before it returns.
    fn print_text(&mut self, text: &str) -> io::Result<()>;

    /// Called instead of `print_text` when a reply carried no text at all.
    fn print_empty_reply(&mut self) -> io::Result<()>;

    /// Called when a reply is complete.
    fn finish_response(&mut self) -> io::Result<()>;

    /// Print an error message on its own line.
    fn print_error(&mut self, error: &str) -> io::Result<()>;

    /// Print an informational line.
    fn print_info(&mut self, info: &str) -> io::Result<()>;
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    line_start: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a renderer on stdout, styled when stdout is a terminal and
    /// `NO_COLOR` is unset.
    pub fn new() -> Self {
        let use_color = io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none();
        Self::with_color(use_color)
    }

    /// Creates a renderer on stdout with the specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer over an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            line_start: true,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.out.write_all(text.as_bytes())?;
        self.line_start = text.ends_with('\n');
        self.out.flush()
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn start_response(&mut self) -> io::Result<()> {
        let label = self.styled(&format!("{ANSI_BOLD}{ANSI_CYAN}"), &format!("{MODEL_LABEL}:"));
        self.write(&format!("\n{label} "))
    }

    fn print_text(&mut self, text: &str) -> io::Result<()> {
        self.write(text)
    }

    fn print_empty_reply(&mut self) -> io::Result<()> {
        let notice = self.styled(ANSI_DIM, "[empty reply]");
        self.write(&notice)
    }

    fn finish_response(&mut self) -> io::Result<()> {
        self.write("\n\n")
    }

    fn print_error(&mut self, error: &str) -> io::Result<()> {
        if !self.line_start {
            self.write("\n")?;
        }
        let line = self.styled(ANSI_RED, &format!("🔴 {error}"));
        self.write(&format!("{line}\n"))
    }

    fn print_info(&mut self, info: &str) -> io::Result<()> {
        self.write(&format!("{info}\n"))
    }
}
