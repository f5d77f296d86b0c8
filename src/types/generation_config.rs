use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every request.
///
/// Unset fields are omitted from the request and fall back to the model's
/// defaults on the service side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Only sample from the top K candidates for each token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum number of tokens in a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Create an empty `GenerationConfig` that defers to model defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration every chat session uses: temperature 0.8, top-p 1.0,
    /// top-k 32 and at most 4096 output tokens.
    pub fn chat_defaults() -> Self {
        Self::new()
            .with_temperature(0.8)
            .with_top_p(1.0)
            .with_top_k(32)
            .with_max_output_tokens(4096)
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the nucleus sampling threshold.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the top-k cutoff.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the maximum reply length in tokens.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}
