//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Remote failures carry an [`ErrorCategory`] so callers and tests can tell
//! an auth problem from a quota problem from a malformed response without
//! string matching.
//!
//! ## Error Categories
//!
//! - **RateLimit**: API rate limiting or quota exhaustion
//! - **TokenLimit**: Request or context too large
//! - **Auth**: Authentication or permission failures
//! - **Network**: Connectivity issues
//! - **Unavailable**: Endpoint or model missing
//! - **ParseError**: Response could not be interpreted
//!
//! Nothing in the system retries automatically; categories only drive
//! diagnostics.

use thiserror::Error;

use super::stage::PipelineStage;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for remote call failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited or quota exceeded
    RateLimit,
    /// Payload or context too large
    TokenLimit,
    /// Authentication failed or token expired
    Auth,
    /// Network/connectivity issues
    Network,
    /// Endpoint, model or resource not found
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Response could not be parsed or was empty
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether running the same command again later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// LLM error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for diagnostics
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("throttling")
            || lower.contains("quota exceeded")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("payloadtoolarge")
            || lower.contains("payload too large")
            || lower.contains("too large")
        {
            return LlmError::with_provider(ErrorCategory::TokenLimit, message, provider);
        }

        if lower.contains("expiredtoken")
            || lower.contains("expired")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("accessdenied")
            || lower.contains("access denied")
            || lower.contains("unauthorized")
            || lower.contains("permission")
            || lower.contains("api key")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timed out")
            || lower.contains("timeout")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("404") || lower.contains("not found") {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("500")
            || lower.contains("502")
            || lower.contains("503")
            || lower.contains("overloaded")
            || lower.contains("service unavailable")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider);
        }

        if lower.contains("400")
            || lower.contains("bad request")
            || lower.contains("validationexception")
            || lower.contains("malformed")
        {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("parse") || lower.contains("json") || lower.contains("empty response") {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            413 => LlmError::with_provider(ErrorCategory::TokenLimit, message, provider),
            400 | 422 => {
                // Bedrock reports oversized payloads as ValidationException
                let lower = message.to_lowercase();
                if lower.contains("too large") || lower.contains("too long") {
                    LlmError::with_provider(ErrorCategory::TokenLimit, message, provider)
                } else {
                    LlmError::with_provider(ErrorCategory::BadRequest, message, provider)
                }
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
            }
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Classify a DocError with type-based routing
    pub fn classify_doc_error(err: &DocError, provider: &str) -> LlmError {
        match err {
            DocError::Llm(llm_err) => llm_err.clone(),
            DocError::LlmApi(msg) => Self::classify(msg, provider),
            DocError::Http(e) if e.is_timeout() || e.is_connect() => {
                LlmError::with_provider(ErrorCategory::Network, err.to_string(), provider)
            }
            DocError::Json(_) => {
                LlmError::with_provider(ErrorCategory::ParseError, err.to_string(), provider)
            }
            DocError::Config(_) => {
                LlmError::with_provider(ErrorCategory::BadRequest, err.to_string(), provider)
            }
            _ => Self::classify(&err.to_string(), provider),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Structured LLM error with category
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Simple LLM API error (use Llm variant for structured errors)
    #[error("LLM API error: {0}")]
    LlmApi(String),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    /// No usable image survived validation; the remote service was not called
    #[error("No valid images to analyze")]
    NoValidImages,

    #[error("Invalid image {path}: {reason}")]
    Image { path: String, reason: String },

    /// A pipeline stage failed; the run is aborted
    #[error("Stage {} ({}) failed [{category}]: {message}", .stage.number(), .stage.name())]
    Stage {
        stage: PipelineStage,
        category: ErrorCategory,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Data source error: {0}")]
    Source(String),

    #[error("Artifact error: {0}")]
    Artifact(String),
}

impl From<LlmError> for DocError {
    fn from(err: LlmError) -> Self {
        DocError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, DocError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl DocError {
    /// Wrap a failure that happened inside a pipeline stage
    pub fn stage(stage: PipelineStage, source: &DocError, provider: &str) -> Self {
        if let DocError::Stage { .. } = source {
            return Self::Stage {
                stage,
                category: source.category(),
                message: source.to_string(),
            };
        }
        let classified = ErrorClassifier::classify_doc_error(source, provider);
        Self::Stage {
            stage,
            category: classified.category,
            message: source.to_string(),
        }
    }

    /// Stage failure for an empty or unusable response
    pub fn empty_response(stage: PipelineStage) -> Self {
        Self::Stage {
            stage,
            category: ErrorCategory::ParseError,
            message: "empty response from model".to_string(),
        }
    }

    /// Category of this error, if it came from a remote call
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Llm(e) => e.category,
            Self::Stage { category, .. } => *category,
            Self::LlmApi(msg) | Self::Store(msg) => ErrorClassifier::classify(msg, "").category,
            Self::Http(e) if e.is_timeout() || e.is_connect() => ErrorCategory::Network,
            Self::Json(_) => ErrorCategory::ParseError,
            Self::Config(_) | Self::NoValidImages | Self::Image { .. } => ErrorCategory::BadRequest,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Short user-facing diagnostic for common remote failures
    pub fn hint(&self) -> Option<&'static str> {
        let text = self.to_string().to_lowercase();
        if text.contains("expiredtoken") || text.contains("expired") {
            return Some("Credentials have expired; refresh the session token or API key");
        }
        match self.category() {
            ErrorCategory::Auth => {
                Some("Access denied; check that the credentials may use this model or space")
            }
            ErrorCategory::TokenLimit => {
                Some("Request too large; use fewer or smaller screenshots")
            }
            ErrorCategory::RateLimit => Some("Rate limited; wait a moment and run again"),
            ErrorCategory::Network => Some("Network problem; check connectivity and endpoints"),
            _ if matches!(self, Self::Config(_)) => {
                Some("Run 'dashdoc config show' to inspect the effective configuration")
            }
            _ => None,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| DocError::Artifact(format!("{}: {}", context.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::TokenLimit.to_string(), "TOKEN_LIMIT");
        assert_eq!(ErrorCategory::ParseError.to_string(), "PARSE_ERROR");
    }

    #[test]
    fn test_classify_expired_token() {
        let err = ErrorClassifier::classify(
            "ExpiredTokenException: The security token included in the request is expired",
            "bedrock",
        );
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_classify_payload_too_large() {
        let err = ErrorClassifier::classify("PayloadTooLarge: request exceeds limit", "bedrock");
        assert_eq!(err.category, ErrorCategory::TokenLimit);
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s", "openai");
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.category.is_transient());
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "Rate limited", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(403, "Forbidden", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let too_large = ErrorClassifier::classify_http_status(
            400,
            "ValidationException: input is too large",
            "bedrock",
        );
        assert_eq!(too_large.category, ErrorCategory::TokenLimit);

        let bad = ErrorClassifier::classify_http_status(400, "missing field", "bedrock");
        assert_eq!(bad.category, ErrorCategory::BadRequest);
    }

    #[test]
    fn test_stage_error_keeps_category() {
        let source = DocError::Llm(LlmError::with_provider(
            ErrorCategory::RateLimit,
            "slow down",
            "bedrock",
        ));
        let err = DocError::stage(PipelineStage::VisualAnalysis, &source, "bedrock");
        assert_eq!(err.category(), ErrorCategory::RateLimit);
        assert!(err.to_string().starts_with("Stage 1 (Visual Analysis) failed"));
        assert_eq!(err.hint(), Some("Rate limited; wait a moment and run again"));
    }

    #[test]
    fn test_hint_for_expired_credentials() {
        let err = DocError::LlmApi("ExpiredToken: session expired".to_string());
        assert!(err.hint().unwrap().contains("expired"));
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "openai");
        assert_eq!(err.to_string(), "[openai:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }
}
