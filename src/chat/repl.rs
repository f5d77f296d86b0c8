//! The interactive loop.
//!
//! The loop alternates between waiting for a line and streaming one reply.
//! A line is read only after the previous reply has finished, so at most
//! one request is ever in flight. Any error ends the loop after it has been
//! shown to the user.

use crate::chat::bootstrap::{print_missing_credential, start_session};
use crate::chat::commands::{UserInput, parse_input};
use crate::chat::input::LineSource;
use crate::chat::session::ChatSession;
use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::render::Renderer;

/// Prompt shown before every user line.
pub const USER_PROMPT: &str = "You: ";

/// How a chat ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatExit {
    /// The user typed `quit` or `exit`.
    Quit,
    /// Console input was closed or interrupted.
    EndOfInput,
}

/// Runs the chat until the user leaves or a turn fails.
///
/// # Errors
///
/// Returns the first error from reading input or from a turn, after
/// printing it through `renderer`.
pub async fn run_chat<B: ChatBackend>(
    session: &mut ChatSession<B>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<ChatExit> {
    match chat_loop(session, input, renderer).await {
        Ok(exit) => {
            renderer.print_info(&format!(
                "\n🤖 Goodbye! It was fun playing '{}'.",
                session.persona()
            ))?;
            Ok(exit)
        }
        Err(err) => report(renderer, err),
    }
}

/// Runs the whole program once a client has been attempted.
///
/// A missing credential prints the remediation text and returns before any
/// prompt is shown. Any other startup error is printed as an error line.
/// Otherwise the persona is asked for and the chat runs to completion.
///
/// # Errors
///
/// Returns the error that ended the program, after it has been printed.
pub async fn run<B: ChatBackend>(
    client: Result<B>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<ChatExit> {
    let client = match client {
        Ok(client) => client,
        Err(err) if err.is_missing_credential() => {
            print_missing_credential(renderer)?;
            return Err(err);
        }
        Err(err) => return report(renderer, err),
    };

    let mut session = match start_session(client, input, renderer) {
        Ok(session) => session,
        Err(err) => return report(renderer, err),
    };

    let exit = run_chat(&mut session, input, renderer).await?;
    tracing::debug!(?exit, turns = session.history().len() / 2, "chat finished");
    Ok(exit)
}

fn report<T>(renderer: &mut dyn Renderer, err: Error) -> Result<T> {
    renderer.print_error(&format!("An error occurred: {err}"))?;
    Err(err)
}

async fn chat_loop<B: ChatBackend>(
    session: &mut ChatSession<B>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<ChatExit> {
    loop {
        let Some(line) = input.read_line(USER_PROMPT)? else {
            return Ok(ChatExit::EndOfInput);
        };

        match parse_input(&line) {
            UserInput::Exit => return Ok(ChatExit::Quit),
            UserInput::Blank => continue,
            UserInput::Message(text) => {
                session.send_streaming(&text, renderer).await?;
            }
        }
    }
}
