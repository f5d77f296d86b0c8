//! Terminal chatbot that plays a persona of your choosing.
//!
//! The persona is asked for once at startup and stays fixed for the whole
//! conversation. Replies stream from the Gemini API as they are generated.
//!
//! # Usage
//!
//! ```bash
//! # The key may also live in a .env file in the working directory
//! export GOOGLE_API_KEY=...
//! personachat
//!
//! # Diagnostics go to stderr
//! RUST_LOG=personachat=debug personachat
//! ```
//!
//! Type `quit` or `exit` (any case) to leave. Ctrl-D and Ctrl-C at the
//! prompt leave as well.

use std::process::ExitCode;

use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use personachat::PlainTextRenderer;
use personachat::chat::{connect, run};

/// Main entry point for the personachat application.
#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut renderer = PlainTextRenderer::new();
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            tracing::error!(error = %err, "failed to open the console");
            return ExitCode::FAILURE;
        }
    };

    match run(connect(), &mut editor, &mut renderer).await {
        Ok(exit) => {
            tracing::debug!(?exit, "exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(error = %err, "exiting with failure");
            ExitCode::FAILURE
        }
    }
}
