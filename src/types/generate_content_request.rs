use serde::{Deserialize, Serialize};

use crate::types::{Content, GenerationConfig, SafetyPolicy};

/// The body of a `generateContent`/`streamGenerateContent` call.
///
/// Carries the full conversation on every call: the service keeps no state
/// between requests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Prior turns followed by the new user turn.
    pub contents: Vec<Content>,

    /// The persona governing every reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    /// Content-safety thresholds.
    #[serde(default, skip_serializing_if = "SafetyPolicy::is_empty")]
    pub safety_settings: SafetyPolicy,
}

impl GenerateContentRequest {
    /// Create a request over the given turns.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            ..Self::default()
        }
    }

    /// Set the system instruction from plain text.
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::system_instruction(text));
        self
    }

    /// Set the sampling parameters.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Set the safety policy.
    pub fn with_safety_settings(mut self, policy: SafetyPolicy) -> Self {
        self.safety_settings = policy;
        self
    }
}
