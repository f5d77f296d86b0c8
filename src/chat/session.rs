//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which holds the
//! conversation and drives one streamed turn at a time.

use std::time::Instant;

use futures::StreamExt;

use crate::chat::config::{ChatConfig, Persona};
use crate::client::{ChatBackend, Gemini};
use crate::error::Result;
use crate::fragments::FragmentStream;
use crate::observability::{
    CHAT_EMPTY_REPLIES, CHAT_FIRST_FRAGMENT, CHAT_FRAGMENTS, CHAT_TURN_DURATION,
    CHAT_TURN_ERRORS, CHAT_TURNS,
};
use crate::render::Renderer;
use crate::types::{Content, GenerateContentRequest, Model, UsageMetadata};

/// What happened during one successful turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnOutcome {
    /// Number of fragments written.
    pub fragments: usize,
    /// The full reply, as the concatenation of all fragments.
    pub reply: String,
    /// Token usage reported by the service, if any.
    pub usage: Option<UsageMetadata>,
}

/// A chat session bound to one persona and one configuration.
///
/// The session keeps the transcript the service needs to continue the
/// conversation. A turn is only recorded once its reply has streamed
/// completely.
pub struct ChatSession<B: ChatBackend = Gemini> {
    backend: B,
    config: ChatConfig,
    history: Vec<Content>,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Creates a new chat session with an empty history.
    pub fn new(backend: B, config: ChatConfig) -> Self {
        Self {
            backend,
            config,
            history: Vec::new(),
        }
    }

    /// Returns the active persona.
    pub fn persona(&self) -> &Persona {
        &self.config.persona
    }

    /// Returns the model the session talks to.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Returns the backend the session sends turns to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the recorded turns, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request carrying persona, configuration and history
    /// 3. Renders each fragment as it arrives
    /// 4. Adds the complete reply to history
    ///
    /// An empty reply is rendered as such and the user message is dropped
    /// from history again.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected, the stream fails, the
    /// service blocks the reply, or the renderer cannot write. The user
    /// message is removed from history in that case.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<TurnOutcome> {
        CHAT_TURNS.click();
        let start = Instant::now();
        let previous_len = self.history.len();

        self.history.push(Content::user(user_input));

        let outcome = self.stream_reply(renderer, start).await;
        CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());

        match outcome {
            Ok(outcome) if outcome.fragments == 0 => {
                CHAT_EMPTY_REPLIES.click();
                tracing::warn!(model = %self.config.model, "service returned an empty reply");
                self.history.truncate(previous_len);
                Ok(outcome)
            }
            Ok(outcome) => {
                tracing::debug!(
                    fragments = outcome.fragments,
                    total_tokens = outcome.usage.map(|u| u.total_token_count),
                    "turn complete"
                );
                self.history.push(Content::model(outcome.reply.clone()));
                Ok(outcome)
            }
            Err(err) => {
                CHAT_TURN_ERRORS.click();
                tracing::debug!(error = %err, "turn failed");
                self.history.truncate(previous_len);
                Err(err)
            }
        }
    }

    fn request(&self) -> GenerateContentRequest {
        GenerateContentRequest::new(self.history.clone())
            .with_system_instruction(self.config.persona.as_str())
            .with_generation_config(self.config.generation_config)
            .with_safety_settings(self.config.safety_policy.clone())
    }

    async fn stream_reply(
        &self,
        renderer: &mut dyn Renderer,
        start: Instant,
    ) -> Result<TurnOutcome> {
        let request = self.request();
        let stream = self
            .backend
            .stream_generate_content(&self.config.model, &request)
            .await?;

        renderer.start_response()?;
        let mut fragments = FragmentStream::new(stream);
        let mut outcome = TurnOutcome::default();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if outcome.fragments == 0 {
                CHAT_FIRST_FRAGMENT.add(start.elapsed().as_secs_f64());
            }
            CHAT_FRAGMENTS.click();
            renderer.print_text(&fragment)?;
            outcome.reply.push_str(&fragment);
            outcome.fragments += 1;
        }
        outcome.usage = fragments.usage();

        if outcome.fragments == 0 {
            renderer.print_empty_reply()?;
        }
        renderer.finish_response()?;
        Ok(outcome)
    }
}
