//! CLI Common Utilities
//!
//! Shared configuration and client construction for command handlers.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::provider::{SharedProvider, create_provider};
use crate::config::{Config, ConfigLoader};
use crate::publish::{ConfluenceClient, InMemoryPageStore, Publisher, SharedPageStore};
use crate::scorecard::Recommender;
use crate::types::Result;

/// Command execution context
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    /// Load the layered configuration, or a single file when given
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    /// Vision-capable provider for both documentation stages
    pub fn provider(&self) -> Result<SharedProvider> {
        let provider = create_provider(&self.config.llm.provider_config())?;
        info!("Using {} ({})", provider.name(), provider.model());
        Ok(provider)
    }

    /// Recommender backed by the configured LLM, or rule-based when the
    /// LLM is disabled or cannot be set up
    pub fn recommender(&self, allow_llm: bool) -> Recommender {
        let config = &self.config.recommendations;
        if !allow_llm || !config.enabled {
            return Recommender::offline(config);
        }
        match create_provider(&config.provider_config()) {
            Ok(provider) => Recommender::new(Some(provider), config),
            Err(e) => {
                warn!("Recommendation model unavailable ({}); using rule-based list", e);
                Recommender::offline(config)
            }
        }
    }

    /// Confluence store, or a process-local one for dry runs
    pub fn page_store(&self, dry_run: bool) -> Result<SharedPageStore> {
        if dry_run {
            return Ok(Arc::new(InMemoryPageStore::new()));
        }
        Ok(Arc::new(ConfluenceClient::new(&self.config.confluence)?))
    }

    pub fn publisher(&self, dry_run: bool) -> Result<Publisher> {
        let mut confluence = self.config.confluence.clone();
        if dry_run && confluence.space_key.is_none() {
            confluence.space_key = Some("DRY-RUN".to_string());
        }
        Ok(Publisher::new(self.page_store(dry_run)?, &confluence))
    }

    /// Parent page title: explicit flag first, then configuration
    pub fn parent_title(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.config.confluence.parent_title.clone())
    }
}
