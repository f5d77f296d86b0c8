//! Interactive chat with a fixed persona.
//!
//! This module provides the terminal chat built on top of the Gemini client.
//! It supports:
//!
//! - A persona chosen once at startup and sent as the system instruction
//! - Streaming replies written fragment by fragment
//! - `quit`/`exit` to leave; any failed turn ends the chat
//!
//! # Architecture
//!
//! - [`bootstrap`]: credential check, persona prompt, banner
//! - [`repl`]: the read/send/stream loop
//! - `session`: conversation state and API interaction
//! - `commands`: classification of input lines
//! - `config`: persona and fixed request configuration

pub mod bootstrap;
mod commands;
mod config;
mod input;
pub mod repl;
mod session;

pub use bootstrap::{choose_persona, connect, print_banner, print_missing_credential, start_session};
pub use commands::{UserInput, parse_input};
pub use config::{ChatConfig, DEFAULT_PERSONA, Persona, PersonaChoice, resolve_persona};
pub use input::LineSource;
pub use repl::{ChatExit, USER_PROMPT, run, run_chat};
pub use session::{ChatSession, TurnOutcome};
