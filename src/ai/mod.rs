//! AI Integration Layer
//!
//! Provider abstraction, prompt construction, screenshot intake and
//! recovery of structured data from model replies.

pub mod image;
pub mod prompt;
pub mod provider;
pub mod validation;

pub use image::{ImageBatch, ImageInput, find_recent_images, load_images};
pub use prompt::{PromptBuilder, PromptTemplates};
pub use provider::{
    BedrockProvider, LlmProvider, LlmRequest, LlmResponse, OpenAiProvider, ProviderConfig,
    ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use validation::{Recovery, recover_json};
