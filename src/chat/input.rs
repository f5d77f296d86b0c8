//! Console line input.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::Result;

/// A source of input lines.
pub trait LineSource {
    /// Shows `prompt` and reads one line.
    ///
    /// Returns `Ok(None)` when the user closes input (Ctrl-D) or interrupts
    /// the prompt (Ctrl-C).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.add_history_entry(trimmed);
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
