//! Session startup: credential check, persona prompt, and banner.

use crate::chat::config::{ChatConfig, Persona, resolve_persona};
use crate::chat::input::LineSource;
use crate::chat::session::ChatSession;
use crate::client::{API_KEY_VARIABLE, ChatBackend, Gemini};
use crate::error::Result;
use crate::render::Renderer;

const RULE: &str = "------------------------------------------------------------";

/// Creates the client from the environment.
///
/// A `.env` file in the working directory is loaded first; variables that
/// are already set win over the file.
pub fn connect() -> Result<Gemini> {
    if let Err(err) = dotenvy::dotenv() {
        if err.not_found() {
            tracing::debug!("no .env file found");
        } else {
            tracing::warn!(error = %err, "ignoring unreadable .env file");
        }
    }
    Gemini::from_env()
}

/// Explains how to provide the API key.
pub fn print_missing_credential(renderer: &mut dyn Renderer) -> Result<()> {
    renderer.print_info(&format!("🔴 Error: {API_KEY_VARIABLE} not found."))?;
    renderer.print_info("👉 Please create a file named `.env` in the same directory.")?;
    renderer.print_info(&format!(
        "   In that file, add the line: {API_KEY_VARIABLE}='YOUR_KEY_HERE'"
    ))?;
    Ok(())
}

/// Asks the user who the chatbot should be.
///
/// A blank answer, or closing input at the prompt, selects the default
/// persona and says so.
pub fn choose_persona(
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<Persona> {
    renderer.print_info("🚀 Let's set up your chatbot!")?;
    renderer.print_info(
        "First, what should the chatbot be? (e.g., 'a pirate', 'a helpful fitness coach')",
    )?;
    let answer = input.read_line("> ")?.unwrap_or_default();

    let choice = resolve_persona(&answer);
    if choice.defaulted {
        renderer.print_info(&format!(
            "No persona given. Using default: '{}'",
            choice.persona
        ))?;
    }
    Ok(choice.persona)
}

/// Shows the persona and how to leave.
pub fn print_banner(persona: &Persona, renderer: &mut dyn Renderer) -> Result<()> {
    renderer.print_info(RULE)?;
    renderer.print_info(&format!("🤖 Chatbot initialized with persona: '{persona}'"))?;
    renderer.print_info("   You can start chatting now. Type 'quit' or 'exit' to end.")?;
    renderer.print_info(RULE)?;
    Ok(())
}

/// Asks for the persona, opens the session, and prints the banner.
pub fn start_session<B: ChatBackend>(
    client: B,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<ChatSession<B>> {
    let persona = choose_persona(input, renderer)?;
    let session = ChatSession::new(client, ChatConfig::new(persona));
    tracing::debug!(model = %session.model(), "chat session started");
    print_banner(session.persona(), renderer)?;
    Ok(session)
}
