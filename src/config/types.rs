//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Secrets (API keys, tokens, passwords) deserialize from files or the
//! environment but are never serialized back out.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::provider::ProviderConfig;
use crate::types::{DocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM settings for the two documentation stages
    pub llm: LlmConfig,

    /// LLM settings for scorecard recommendations
    pub recommendations: RecommendationConfig,

    /// Confluence publishing settings
    pub confluence: ConfluenceConfig,

    /// Scorecard warehouse connection
    pub redshift: RedshiftConfig,

    /// Local artifact output
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            recommendations: RecommendationConfig::default(),
            confluence: ConfluenceConfig::default(),
            redshift: RedshiftConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocError::Config` on validation failure.
    ///
    /// Missing credentials are not checked here; each client reports them
    /// when it is constructed.
    pub fn validate(&self) -> Result<()> {
        for (name, temperature) in [
            ("llm.analysis_temperature", self.llm.analysis_temperature),
            ("llm.documentation_temperature", self.llm.documentation_temperature),
            ("recommendations.temperature", self.recommendations.temperature),
        ] {
            if !(0.0..=1.0).contains(&temperature) {
                return Err(DocError::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, temperature
                )));
            }
        }

        if self.llm.timeout_secs == 0 || self.confluence.timeout_secs == 0 {
            return Err(DocError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.analysis_max_tokens == 0 || self.llm.documentation_max_tokens == 0 {
            return Err(DocError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.redshift.port == 0 {
            return Err(DocError::Config("redshift.port must be non-zero".to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "bedrock" or "openai"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// AWS region for the Bedrock runtime endpoint
    pub region: String,

    /// Bedrock API key or OpenAI key; falls back to provider env vars
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Endpoint override
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub analysis_temperature: f32,
    pub analysis_max_tokens: usize,
    pub documentation_temperature: f32,
    pub documentation_max_tokens: usize,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("region", &self.region)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "bedrock".to_string(),
            model: "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string(),
            region: "us-west-2".to_string(),
            api_key: None,
            api_base: None,
            timeout_secs: 300,
            analysis_temperature: 0.1,
            analysis_max_tokens: 8000,
            documentation_temperature: 0.1,
            documentation_max_tokens: 16000,
        }
    }
}

impl LlmConfig {
    /// Provider settings shared by both documentation stages
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: Some(self.model.clone()),
            region: Some(self.region.clone()),
            timeout_secs: self.timeout_secs,
            temperature: self.analysis_temperature,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            max_tokens: self.analysis_max_tokens,
        }
    }
}

// =============================================================================
// Recommendation Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Use an LLM for narrative recommendations; rule-based otherwise
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RecommendationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            api_base: None,
            temperature: 0.7,
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

impl RecommendationConfig {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: Some(self.model.clone()),
            region: None,
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

// =============================================================================
// Confluence Configuration
// =============================================================================

/// What to do when a page with the target title already exists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Update the existing page in place (version + 1)
    #[default]
    Replace,
    /// Create a sibling page with a timestamped title
    AlwaysCreateNew,
}

impl std::str::FromStr for UpdateMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "replace" | "update" => Ok(UpdateMode::Replace),
            "always_create_new" | "new" => Ok(UpdateMode::AlwaysCreateNew),
            _ => Err(format!(
                "Unknown update mode: {}. Valid values: replace, always-create-new",
                s
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceConfig {
    /// Site URL, e.g. https://example.atlassian.net
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub space_key: Option<String>,

    /// Default parent page title for new pages
    pub parent_title: Option<String>,

    pub update_mode: UpdateMode,

    /// Labels attached after every successful publish
    pub labels: Vec<String>,

    pub timeout_secs: u64,
}

impl std::fmt::Debug for ConfluenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluenceConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("space_key", &self.space_key)
            .field("parent_title", &self.parent_title)
            .field("update_mode", &self.update_mode)
            .field("labels", &self.labels)
            .finish()
    }
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            api_token: None,
            space_key: None,
            parent_title: None,
            update_mode: UpdateMode::Replace,
            labels: vec![
                "dashboard-documentation".to_string(),
                "user-guide".to_string(),
                "auto-generated".to_string(),
            ],
            timeout_secs: 60,
        }
    }
}

impl ConfluenceConfig {
    /// Environment names of required settings that are unset or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("CONFLUENCE_URL", &self.url),
            ("CONFLUENCE_USERNAME", &self.username),
            ("CONFLUENCE_API_TOKEN", &self.api_token),
            ("CONFLUENCE_SPACE_KEY", &self.space_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }
}

// =============================================================================
// Redshift Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedshiftConfig {
    pub host: Option<String>,
    pub port: u16,
    pub database: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Fully qualified scorecard table
    pub table: String,
    /// Business unit filter
    pub business_unit: String,
    /// First month included (ISO date)
    pub window_start: String,
}

impl std::fmt::Debug for RedshiftConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedshiftConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("table", &self.table)
            .field("business_unit", &self.business_unit)
            .field("window_start", &self.window_start)
            .finish()
    }
}

impl Default for RedshiftConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 5439,
            database: None,
            user: None,
            password: None,
            table: "ba_corporate.scorecard_test_dn".to_string(),
            business_unit: "CARE & SERVICES".to_string(),
            window_start: "2025-01-01".to_string(),
        }
    }
}

impl RedshiftConfig {
    /// Environment names of required settings that are unset or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("REDSHIFT_HOST", &self.host),
            ("REDSHIFT_DATABASE", &self.database),
            ("REDSHIFT_USER", &self.user),
            ("REDSHIFT_PASSWORD", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for analyses, guides and copied screenshots
    pub dir: PathBuf,

    /// Copy source screenshots into `{dir}/images`
    pub copy_images: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            copy_images: true,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "bedrock");
        assert_eq!(config.llm.analysis_max_tokens, 8000);
        assert_eq!(config.llm.documentation_max_tokens, 16000);
        assert_eq!(config.redshift.port, 5439);
        assert_eq!(config.confluence.update_mode, UpdateMode::Replace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.recommendations.temperature = 1.5;
        assert!(matches!(config.validate(), Err(DocError::Config(_))));
    }

    #[test]
    fn test_missing_confluence_fields() {
        let mut confluence = ConfluenceConfig::default();
        confluence.url = Some("https://example.atlassian.net".to_string());
        confluence.space_key = Some("  ".to_string());
        assert_eq!(
            confluence.missing_fields(),
            vec![
                "CONFLUENCE_USERNAME",
                "CONFLUENCE_API_TOKEN",
                "CONFLUENCE_SPACE_KEY"
            ]
        );
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = Config::default();
        config.confluence.api_token = Some("secret-token".to_string());
        config.redshift.password = Some("hunter2".to_string());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("hunter2"));
        assert!(!format!("{:?}", config).contains("secret-token"));
    }

    #[test]
    fn test_update_mode_parse() {
        assert_eq!(
            "always-create-new".parse::<UpdateMode>().unwrap(),
            UpdateMode::AlwaysCreateNew
        );
        assert_eq!("replace".parse::<UpdateMode>().unwrap(), UpdateMode::Replace);
        assert!("merge".parse::<UpdateMode>().is_err());
    }
}
