//! Publishing
//!
//! Title-keyed upsert of guides into the document store:
//!
//! 1. Look the title up in the configured space
//! 2. Found: update in place (version + 1), or create a timestamped sibling
//!    when the update mode is `always_create_new`; a ` #2`, ` #3`, ...
//!    counter goes inside the stamp while that title is taken
//! 3. Not found: create under the parent page, or the space root when the
//!    parent cannot be resolved
//! 4. Attach labels, best effort
//!
//! Store failures never escape as errors; they come back as an unsuccessful
//! [`PublishOutcome`]. Two concurrent runs on the same title race: both may
//! see "not found" and both create.

pub mod confluence;
pub mod storage_format;
pub mod store;

pub use confluence::ConfluenceClient;
pub use storage_format::{image_embed, to_storage_format, with_screenshots};
pub use store::{InMemoryPageStore, NewPage, PageStore, RemotePage, SharedPageStore, SpaceInfo};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai::image::ImageInput;
use crate::config::{ConfluenceConfig, UpdateMode};
use crate::constants::confluence::TITLE_TIMESTAMP_FORMAT;
use crate::types::{PageId, Result};

/// What the upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishAction {
    Created,
    Updated,
    CreatedNew,
}

impl std::fmt::Display for PublishAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::CreatedNew => write!(f, "created_new"),
        }
    }
}

/// Result of a publish attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub success: bool,
    pub page_id: Option<PageId>,
    pub page_url: Option<String>,
    pub action: Option<PublishAction>,
    /// Title the page ended up with
    pub title: String,
    pub error: Option<String>,
}

impl PublishOutcome {
    fn published(page: &RemotePage, action: PublishAction) -> Self {
        Self {
            success: true,
            page_id: Some(page.id.clone()),
            page_url: page.url.clone(),
            action: Some(action),
            title: page.title.clone(),
            error: None,
        }
    }

    fn failed(title: &str, error: String) -> Self {
        Self {
            success: false,
            page_id: None,
            page_url: None,
            action: None,
            title: title.to_string(),
            error: Some(error),
        }
    }
}

/// Upserts guides into one space of a page store
pub struct Publisher {
    store: SharedPageStore,
    space_key: String,
    update_mode: UpdateMode,
    labels: Vec<String>,
}

impl Publisher {
    pub fn new(store: SharedPageStore, config: &ConfluenceConfig) -> Self {
        Self {
            store,
            space_key: config.space_key.clone().unwrap_or_default(),
            update_mode: config.update_mode,
            labels: config.labels.clone(),
        }
    }

    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn space_key(&self) -> &str {
        &self.space_key
    }

    /// Create or update the page titled `title`
    pub async fn upsert(
        &self,
        title: &str,
        body: &str,
        parent_title: Option<&str>,
    ) -> PublishOutcome {
        let storage_body = to_storage_format(body);
        match self.upsert_page(title, &storage_body, parent_title).await {
            Ok((page, action)) => {
                self.apply_labels(&page.id).await;
                info!("Published '{}' ({}, id {})", page.title, action, page.id);
                PublishOutcome::published(&page, action)
            }
            Err(e) => {
                warn!("Publishing '{}' failed: {}", title, e);
                PublishOutcome::failed(title, e.to_string())
            }
        }
    }

    /// Upsert, then attach screenshots and embed them in the page
    ///
    /// Attachment failures are skipped. If embedding fails the page stays
    /// published without the screenshot section.
    pub async fn publish_with_images(
        &self,
        title: &str,
        body: &str,
        parent_title: Option<&str>,
        images: &[ImageInput],
    ) -> PublishOutcome {
        let storage_body = to_storage_format(body);
        let (page, action) = match self.upsert_page(title, &storage_body, parent_title).await {
            Ok(published) => published,
            Err(e) => {
                warn!("Publishing '{}' failed: {}", title, e);
                return PublishOutcome::failed(title, e.to_string());
            }
        };

        let mut attached = Vec::new();
        for image in images {
            match self
                .store
                .upload_attachment(&page.id, &image.name, &image.media_type, image.bytes.clone())
                .await
            {
                Ok(name) => attached.push(name),
                Err(e) => warn!("Skipping attachment {}: {}", image.name, e),
            }
        }

        let page = if attached.is_empty() {
            page
        } else {
            let embedded = with_screenshots(&storage_body, &attached);
            match self
                .store
                .update(&page, &page.title, &embedded, page.version + 1)
                .await
            {
                Ok(updated) => {
                    info!("Embedded {} screenshot(s) in '{}'", attached.len(), updated.title);
                    updated
                }
                Err(e) => {
                    warn!("Could not embed screenshots in '{}': {}", page.title, e);
                    page
                }
            }
        };

        self.apply_labels(&page.id).await;
        PublishOutcome::published(&page, action)
    }

    async fn upsert_page(
        &self,
        title: &str,
        body: &str,
        parent_title: Option<&str>,
    ) -> Result<(RemotePage, PublishAction)> {
        let existing = self.store.find_by_title(&self.space_key, title).await?;

        match (existing, self.update_mode) {
            (Some(page), UpdateMode::Replace) => {
                let updated = self
                    .store
                    .update(&page, title, body, page.version + 1)
                    .await?;
                Ok((updated, PublishAction::Updated))
            }
            (Some(page), UpdateMode::AlwaysCreateNew) => {
                let stamped = self.unique_title(title).await?;
                let created = self
                    .store
                    .create(NewPage {
                        space_key: &self.space_key,
                        title: &stamped,
                        body,
                        parent_id: page.parent_id.as_ref(),
                    })
                    .await?;
                Ok((created, PublishAction::CreatedNew))
            }
            (None, _) => {
                let parent_id = self.resolve_parent(parent_title).await;
                let created = self
                    .store
                    .create(NewPage {
                        space_key: &self.space_key,
                        title,
                        body,
                        parent_id: parent_id.as_ref(),
                    })
                    .await?;
                Ok((created, PublishAction::Created))
            }
        }
    }

    /// `{title} ({timestamp})`, or `{title} ({timestamp} #n)` when a page
    /// created in the same second already holds it
    async fn unique_title(&self, title: &str) -> Result<String> {
        let stamp = Local::now().format(TITLE_TIMESTAMP_FORMAT).to_string();
        let mut candidate = format!("{} ({})", title, stamp);
        let mut counter = 2;
        while self
            .store
            .find_by_title(&self.space_key, &candidate)
            .await?
            .is_some()
        {
            candidate = format!("{} ({} #{})", title, stamp, counter);
            counter += 1;
        }
        Ok(candidate)
    }

    /// Parent page id by title; `None` places the page at the space root
    async fn resolve_parent(&self, parent_title: Option<&str>) -> Option<PageId> {
        let parent_title = parent_title.filter(|t| !t.trim().is_empty())?;
        match self.store.find_by_title(&self.space_key, parent_title).await {
            Ok(Some(parent)) => Some(parent.id),
            Ok(None) => {
                warn!("Parent page '{}' not found; using space root", parent_title);
                None
            }
            Err(e) => {
                warn!("Parent lookup for '{}' failed ({}); using space root", parent_title, e);
                None
            }
        }
    }

    async fn apply_labels(&self, id: &PageId) {
        if self.labels.is_empty() {
            return;
        }
        if let Err(e) = self.store.add_labels(id, &self.labels).await {
            warn!("Could not label page {}: {}", id, e);
        }
    }
}
