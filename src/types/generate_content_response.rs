use serde::{Deserialize, Serialize};

use crate::types::Content;

/// Why a candidate stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Natural stop point or a stop sequence.
    Stop,
    /// The output token limit was reached.
    MaxTokens,
    /// Flagged by the safety filter.
    Safety,
    /// Flagged for reciting training data.
    Recitation,
    /// Contained a blocklisted term.
    Blocklist,
    /// Potentially contained prohibited content.
    ProhibitedContent,
    /// Potentially contained sensitive personally identifiable information.
    Spii,
    /// Unknown reason.
    Other,
    /// A reason this client does not know about.
    #[serde(untagged)]
    Unrecognized(String),
}

impl FinishReason {
    /// Returns true if this reason means the reply was withheld by the service.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
                | FinishReason::Other
        )
    }

    /// The wire name of this reason.
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Safety => "SAFETY",
            FinishReason::Recitation => "RECITATION",
            FinishReason::Blocklist => "BLOCKLIST",
            FinishReason::ProhibitedContent => "PROHIBITED_CONTENT",
            FinishReason::Spii => "SPII",
            FinishReason::Other => "OTHER",
            FinishReason::Unrecognized(reason) => reason,
        }
    }
}

/// One generated candidate within a response chunk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content, absent when the candidate was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Set on the final chunk of a candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Index of the candidate in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Token accounting for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, including history and system instruction.
    #[serde(default)]
    pub prompt_token_count: u32,

    /// Tokens across all generated candidates.
    #[serde(default)]
    pub candidates_token_count: u32,

    /// Prompt and candidate tokens together.
    #[serde(default)]
    pub total_token_count: u32,
}

/// A complete response or, when streaming, one chunk of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates. Chat requests produce at most one.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Present when the prompt itself was judged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Token usage, usually attached to the last chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// The model version that produced the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Create a single-candidate chunk carrying `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content::model(text)),
                ..Candidate::default()
            }],
            ..Self::default()
        }
    }

    /// Set the finish reason of the first candidate.
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        if self.candidates.is_empty() {
            self.candidates.push(Candidate::default());
        }
        self.candidates[0].finish_reason = Some(reason);
        self
    }

    /// Text of the first candidate, if any part carries text.
    pub fn text(&self) -> Option<String> {
        self.candidates.first()?.content.as_ref()?.text()
    }

    /// Finish reason of the first candidate.
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.candidates.first()?.finish_reason.as_ref()
    }

    /// The prompt block reason, if the prompt was rejected.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}
