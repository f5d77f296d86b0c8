//! Configuration types for the chat application.
//!
//! Everything here is fixed once the session starts: the persona, the
//! model, the sampling parameters and the safety policy.

use std::fmt;

use crate::types::{GenerationConfig, KnownModel, Model, SafetyPolicy};

/// Persona used when the user does not supply one.
pub const DEFAULT_PERSONA: &str = "A helpful and friendly AI assistant.";

/// The system instruction that conditions every reply.
///
/// Always non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona(String);

impl Persona {
    /// Creates a persona from user text, or `None` if the text is blank.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }

    /// Returns the persona text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self(DEFAULT_PERSONA.to_string())
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The outcome of resolving the user's persona answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaChoice {
    /// The persona the session will use.
    pub persona: Persona,
    /// True when the answer was blank and [`DEFAULT_PERSONA`] was substituted.
    pub defaulted: bool,
}

/// Picks the persona for an answer to the startup prompt.
pub fn resolve_persona(answer: &str) -> PersonaChoice {
    match Persona::new(answer) {
        Some(persona) => PersonaChoice {
            persona,
            defaulted: false,
        },
        None => PersonaChoice {
            persona: Persona::default(),
            defaulted: true,
        },
    }
}

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// The system instruction sent with every turn.
    pub persona: Persona,

    /// Sampling parameters.
    pub generation_config: GenerationConfig,

    /// Content-safety thresholds.
    pub safety_policy: SafetyPolicy,
}

impl ChatConfig {
    /// Creates a new ChatConfig for `persona` with default values.
    ///
    /// Defaults:
    /// - Model: gemini-1.5-pro-latest
    /// - Sampling: temperature 0.8, top-p 1.0, top-k 32, 4096 output tokens
    /// - Safety: medium-and-above blocking on the four core harm categories
    pub fn new(persona: Persona) -> Self {
        Self {
            model: Model::Known(KnownModel::Gemini15ProLatest),
            persona,
            generation_config: GenerationConfig::chat_defaults(),
            safety_policy: SafetyPolicy::chat_defaults(),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling parameters.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    /// Sets the safety policy.
    pub fn with_safety_policy(mut self, policy: SafetyPolicy) -> Self {
        self.safety_policy = policy;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(Persona::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini15ProLatest));
        assert_eq!(config.persona.as_str(), DEFAULT_PERSONA);
        assert_eq!(config.generation_config.temperature, Some(0.8));
        assert_eq!(config.generation_config.top_p, Some(1.0));
        assert_eq!(config.generation_config.top_k, Some(32));
        assert_eq!(config.generation_config.max_output_tokens, Some(4096));
        assert_eq!(config.safety_policy.settings().len(), 4);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new(Persona::new("a grumpy pirate").unwrap())
            .with_model(Model::Known(KnownModel::Gemini25Flash))
            .with_generation_config(GenerationConfig::new().with_temperature(0.2))
            .with_safety_policy(SafetyPolicy::new());

        assert_eq!(config.persona.as_str(), "a grumpy pirate");
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(config.generation_config.top_k, None);
        assert!(config.safety_policy.is_empty());
    }

    #[test]
    fn persona_is_trimmed() {
        let choice = resolve_persona("  a helpful fitness coach \n");
        assert_eq!(choice.persona.as_str(), "a helpful fitness coach");
        assert!(!choice.defaulted);
    }

    #[test]
    fn blank_persona_uses_default() {
        for answer in ["", "   ", "\t\n"] {
            let choice = resolve_persona(answer);
            assert_eq!(choice.persona.as_str(), DEFAULT_PERSONA);
            assert!(choice.defaulted);
        }
    }
}
