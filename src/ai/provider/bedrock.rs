//! Amazon Bedrock Provider
//!
//! Invokes Anthropic models through the Bedrock runtime `InvokeModel` API
//! using the Anthropic Messages body. Authentication uses a Bedrock API key
//! sent as a bearer token; request signing is not implemented.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    LlmProvider, LlmRequest, LlmResponse, ProviderConfig, ResponseMetadata, ResponseTiming,
    TokenUsage, error_from_response,
};
use crate::types::{DocError, ErrorCategory, LlmError, Result};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_MODEL: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";
const DEFAULT_REGION: &str = "us-west-2";
const PROVIDER: &str = "bedrock";

pub struct BedrockProvider {
    api_key: SecretString,
    endpoint: Url,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for BedrockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockProvider")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl BedrockProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("AWS_BEARER_TOKEN_BEDROCK").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                DocError::Config(
                    "Bedrock API key not found. Set AWS_BEARER_TOKEN_BEDROCK or llm.api_key"
                        .to_string(),
                )
            })?;

        let region = config.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = config
            .api_base
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", region));
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| DocError::Config(format!("Invalid Bedrock endpoint {}: {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            endpoint,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }

    /// `{endpoint}/model/{model_id}/invoke`
    fn invoke_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| DocError::Config(format!("Invalid Bedrock endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["model", self.model.as_str(), "invoke"]);
        Ok(url)
    }

    fn build_body(request: &LlmRequest) -> InvokeBody {
        let mut content: Vec<ContentBlock> = request
            .images
            .iter()
            .map(|image| ContentBlock::Image {
                source: ImageSource {
                    source_type: "base64".to_string(),
                    media_type: image.media_type.clone(),
                    data: image.to_base64(),
                },
            })
            .collect();
        content.push(ContentBlock::Text {
            text: request.prompt.clone(),
        });

        InvokeBody {
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
        }
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        info!(
            "Invoking Bedrock (model: {}, images: {}, max_tokens: {})",
            self.model,
            request.images.len(),
            request.max_tokens
        );

        let start_time = Instant::now();
        let url = self.invoke_url()?;
        let body = Self::build_body(request);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DocError::Llm(LlmError::with_provider(
                    if e.is_timeout() || e.is_connect() {
                        ErrorCategory::Network
                    } else {
                        ErrorCategory::Unknown
                    },
                    format!("Bedrock request failed: {}", e),
                    PROVIDER,
                ))
            })?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            return Err(error_from_response(response, PROVIDER).await);
        }

        let reply: InvokeResponse = response.json().await.map_err(|e| {
            DocError::Llm(LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to parse Bedrock response: {}", e),
                PROVIDER,
            ))
        })?;

        let content: String = reply
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = reply
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        debug!(
            "Bedrock replied in {}ms ({} tokens, stop: {:?})",
            elapsed.as_millis(),
            usage.total(),
            reply.stop_reason
        );

        if reply.stop_reason.as_deref() == Some("max_tokens") {
            warn!("Bedrock output truncated at max_tokens={}", request.max_tokens);
        }

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER.to_string(),
                stop_reason: reply.stop_reason,
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        match self.generate(&LlmRequest::text("ping", 1, 0.0)).await {
            Ok(_) => {
                info!("Bedrock model {} is available", self.model);
                Ok(true)
            }
            Err(e) => {
                warn!("Bedrock check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct InvokeBody {
    anthropic_version: String,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
