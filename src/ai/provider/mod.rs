//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait: one prompt plus an ordered list of images
//! in, one text blob out. Structure in the reply is the caller's business.
//!
//! ## Providers
//!
//! - `bedrock`: Anthropic models through the Bedrock runtime invoke API
//! - `openai`: OpenAI Chat Completions

mod bedrock;
mod openai;

pub use bedrock::BedrockProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ai::image::ImageInput;
use crate::types::{DocError, Result};

// =============================================================================
// Request / Response
// =============================================================================

/// One generation request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    /// Images shown to the model before the prompt, in order
    pub images: Vec<ImageInput>,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl LlmRequest {
    /// Text-only request
    pub fn text(prompt: impl Into<String>, max_tokens: usize, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            images: Vec::new(),
            max_tokens,
            temperature,
        }
    }

    pub fn with_images(mut self, images: Vec<ImageInput>) -> Self {
        self.images = images;
        self
    }

    /// Size of all images once base64-encoded
    pub fn encoded_image_bytes(&self) -> usize {
        self.images.iter().map(ImageInput::encoded_len).sum()
    }
}

/// Complete LLM response including content and usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub content: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
    /// Provider and model info
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
    /// Why generation stopped, as reported by the provider
    pub stop_reason: Option<String>,
}

/// Shared LLM provider handle
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Each provider converts the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "bedrock", "openai"
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// AWS region (bedrock only)
    #[serde(default)]
    pub region: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Default temperature when a request does not override it
    pub temperature: f32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Default maximum tokens to generate
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("region", &self.region)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "bedrock".to_string(),
            model: None,
            region: None,
            timeout_secs: 300,
            temperature: 0.1,
            api_key: None,
            api_base: None,
            max_tokens: 4096,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Text generation with optional image inputs
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a reply to `request`
    ///
    /// Remote failures come back as `DocError::Llm` with a category.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Whether the provider accepts image inputs
    fn supports_images(&self) -> bool {
        true
    }

    /// Check if the provider is reachable with the configured credentials
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "bedrock" => Ok(Arc::new(BedrockProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        _ => Err(DocError::Config(format!(
            "Unknown provider: {}. Supported: bedrock, openai",
            config.provider
        ))),
    }
}

/// Turn a non-success HTTP reply into a categorized error
pub(crate) async fn error_from_response(response: reqwest::Response, provider: &str) -> DocError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = format!("{} API error ({}): {}", provider, status, body);
    DocError::Llm(ErrorClassifier::classify_http_status(
        status.as_u16(),
        &message,
        provider,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let config = ProviderConfig {
            provider: "claude-code".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(DocError::Config(msg)) if msg.contains("claude-code")
        ));
    }

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn test_request_encoded_size() {
        let image = ImageInput::from_bytes("a.png", vec![0u8; 300]).unwrap();
        let request = LlmRequest::text("describe", 100, 0.1).with_images(vec![image.clone(), image]);
        assert_eq!(request.encoded_image_bytes(), 800);
    }
}
