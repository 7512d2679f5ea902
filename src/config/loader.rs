//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/dashdoc/config.toml)
//! 3. Project config (.dashdoc/config.toml)
//! 4. Conventional environment variables (CONFLUENCE_URL, REDSHIFT_HOST, ...)
//! 5. Environment variables (DASHDOC_* prefix, `__` for nesting)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{DocError, Result};

/// Conventional variable names mapped onto config keys
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("CONFLUENCE_URL", "confluence.url"),
    ("CONFLUENCE_USERNAME", "confluence.username"),
    ("CONFLUENCE_API_TOKEN", "confluence.api_token"),
    ("CONFLUENCE_SPACE_KEY", "confluence.space_key"),
    ("REDSHIFT_HOST", "redshift.host"),
    ("REDSHIFT_DATABASE", "redshift.database"),
    ("REDSHIFT_PORT", "redshift.port"),
    ("REDSHIFT_USER", "redshift.user"),
    ("REDSHIFT_PASSWORD", "redshift.password"),
    ("AWS_REGION", "llm.region"),
    ("AWS_BEARER_TOKEN_BEDROCK", "llm.api_key"),
    ("OPENAI_API_KEY", "recommendations.api_key"),
];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // CONFLUENCE_URL -> confluence.url, etc.
        figment = figment.merge(Env::raw().filter_map(|key| {
            Self::legacy_env_key(key.as_str()).map(|mapped| mapped.into())
        }));

        // DASHDOC_CONFLUENCE__SPACE_KEY -> confluence.space_key
        figment = figment.merge(Env::prefixed("DASHDOC_").split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| DocError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Config key for a conventional environment variable name
    pub fn legacy_env_key(name: &str) -> Option<&'static str> {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(env_name, _)| env_name.eq_ignore_ascii_case(name))
            .map(|(_, key)| *key)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/dashdoc/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("dashdoc"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project config directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".dashdoc")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration as toml, json or yaml
    pub fn render(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            _ => toml::to_string_pretty(config).map_err(|e| DocError::Config(e.to_string())),
        }
    }

    /// Initialize a config file, globally or for the current directory
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let config_path = if global {
            Self::global_config_path().ok_or_else(|| {
                DocError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_toml())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_config_toml() -> &'static str {
        r#"# dashdoc configuration
# Secrets are best supplied through the environment:
#   AWS_BEARER_TOKEN_BEDROCK, OPENAI_API_KEY, CONFLUENCE_API_TOKEN, REDSHIFT_PASSWORD

version = "1.0"

[llm]
provider = "bedrock"
model = "anthropic.claude-3-5-sonnet-20241022-v2:0"
region = "us-west-2"
timeout_secs = 300

[recommendations]
enabled = true
provider = "openai"
model = "gpt-3.5-turbo"

[confluence]
# url = "https://example.atlassian.net"
# username = "someone@example.com"
# space_key = "DOCS"
# parent_title = "Dashboards"
update_mode = "replace"

[redshift]
port = 5439
table = "ba_corporate.scorecard_test_dn"
business_unit = "CARE & SERVICES"
window_start = "2025-01-01"

[output]
dir = "outputs"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateMode;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[confluence]
space_key = "OPS"
update_mode = "always_create_new"

[output]
dir = "docs/out"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.confluence.space_key.as_deref(), Some("OPS"));
        assert_eq!(config.confluence.update_mode, UpdateMode::AlwaysCreateNew);
        assert_eq!(config.output.dir, PathBuf::from("docs/out"));
        assert_eq!(config.llm.provider, "bedrock");
    }

    #[test]
    fn test_default_template_parses() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, ConfigLoader::default_config_toml()).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.redshift.business_unit, "CARE & SERVICES");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[llm]\ntimeout_secs = 0\n").unwrap();

        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(DocError::Config(_))
        ));
    }

    #[test]
    fn test_legacy_env_keys() {
        assert_eq!(
            ConfigLoader::legacy_env_key("CONFLUENCE_SPACE_KEY"),
            Some("confluence.space_key")
        );
        assert_eq!(
            ConfigLoader::legacy_env_key("OPENAI_API_KEY"),
            Some("recommendations.api_key")
        );
        assert_eq!(ConfigLoader::legacy_env_key("PATH"), None);
    }

    #[test]
    fn test_render_formats() {
        let config = Config::default();
        assert!(ConfigLoader::render(&config, "toml").unwrap().contains("[llm]"));
        assert!(ConfigLoader::render(&config, "json").unwrap().contains("\"llm\""));
        assert!(ConfigLoader::render(&config, "yaml").unwrap().contains("llm:"));
    }
}
