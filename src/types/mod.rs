// Public modules
pub mod content;
pub mod generate_content_request;
pub mod generate_content_response;
pub mod generation_config;
pub mod model;
pub mod safety_setting;

// Re-exports
pub use content::{Content, Part, Role};
pub use generate_content_request::GenerateContentRequest;
pub use generate_content_response::{
    Candidate, FinishReason, GenerateContentResponse, PromptFeedback, UsageMetadata,
};
pub use generation_config::GenerationConfig;
pub use model::{KnownModel, Model};
pub use safety_setting::{HarmBlockThreshold, HarmCategory, SafetyPolicy, SafetySetting};
