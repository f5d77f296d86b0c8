// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod fragments;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use client::{API_KEY_VARIABLE, ChatBackend, Gemini, ResponseStream};
pub use error::{Error, Result};
pub use fragments::FragmentStream;
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
