//! Document store abstraction
//!
//! Title-keyed page storage as exposed by Confluence: look a page up by
//! title inside a space, create it, or replace its body with an explicit
//! version number.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::types::{DocError, PageId, Result};

/// A page as held by the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePage {
    pub id: PageId,
    pub title: String,
    pub space_key: String,
    /// Starts at 1, +1 per update
    pub version: u32,
    pub body: String,
    pub parent_id: Option<PageId>,
    pub url: Option<String>,
}

/// Input for page creation
#[derive(Debug, Clone)]
pub struct NewPage<'a> {
    pub space_key: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub parent_id: Option<&'a PageId>,
}

/// Space metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub key: String,
    pub name: String,
    pub url: Option<String>,
}

/// Title-keyed page CRUD plus labels and attachments
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Page with exactly this title in `space_key`, if any
    async fn find_by_title(&self, space_key: &str, title: &str) -> Result<Option<RemotePage>>;

    async fn create(&self, page: NewPage<'_>) -> Result<RemotePage>;

    /// Replace title and body; `version` must be the current version + 1
    async fn update(&self, page: &RemotePage, title: &str, body: &str, version: u32)
    -> Result<RemotePage>;

    async fn add_labels(&self, id: &PageId, labels: &[String]) -> Result<()>;

    /// Attach a file to a page, replacing an attachment of the same name
    async fn upload_attachment(
        &self,
        id: &PageId,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String>;

    /// Display name of the authenticated user
    async fn test_connection(&self) -> Result<String>;

    async fn get_space_info(&self, space_key: &str) -> Result<SpaceInfo>;

    /// Store name for logging
    fn name(&self) -> &str;
}

pub type SharedPageStore = Arc<dyn PageStore>;

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local page store for dry runs and tests
#[derive(Debug, Default)]
pub struct InMemoryPageStore {
    pages: DashMap<PageId, RemotePage>,
    labels: DashMap<PageId, Vec<String>>,
    attachments: DashMap<PageId, Vec<String>>,
    next_id: AtomicU64,
    fail_labels: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every label call fail
    pub fn fail_labels(&self, fail: bool) {
        self.fail_labels.store(fail, Ordering::SeqCst);
    }

    /// Make every call fail as if the service were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed a page directly
    pub fn insert(&self, page: RemotePage) {
        self.pages.insert(page.id.clone(), page);
    }

    pub fn page(&self, id: &PageId) -> Option<RemotePage> {
        self.pages.get(id).map(|p| p.clone())
    }

    pub fn pages(&self) -> Vec<RemotePage> {
        let mut pages: Vec<_> = self.pages.iter().map(|p| p.clone()).collect();
        pages.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        pages
    }

    pub fn labels(&self, id: &PageId) -> Vec<String> {
        self.labels.get(id).map(|l| l.clone()).unwrap_or_default()
    }

    pub fn attachments(&self, id: &PageId) -> Vec<String> {
        self.attachments.get(id).map(|a| a.clone()).unwrap_or_default()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocError::Store("503 service unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn find_by_title(&self, space_key: &str, title: &str) -> Result<Option<RemotePage>> {
        self.check_available()?;
        Ok(self
            .pages
            .iter()
            .find(|p| p.space_key == space_key && p.title == title)
            .map(|p| p.clone()))
    }

    async fn create(&self, page: NewPage<'_>) -> Result<RemotePage> {
        self.check_available()?;
        if self.find_by_title(page.space_key, page.title).await?.is_some() {
            return Err(DocError::Store(format!(
                "400 a page with title '{}' already exists in space {}",
                page.title, page.space_key
            )));
        }

        let id = PageId::new((self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string());
        let created = RemotePage {
            id: id.clone(),
            title: page.title.to_string(),
            space_key: page.space_key.to_string(),
            version: 1,
            body: page.body.to_string(),
            parent_id: page.parent_id.cloned(),
            url: Some(format!("memory://{}/{}", page.space_key, id)),
        };
        self.pages.insert(id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        page: &RemotePage,
        title: &str,
        body: &str,
        version: u32,
    ) -> Result<RemotePage> {
        self.check_available()?;
        let mut stored = self
            .pages
            .get_mut(&page.id)
            .ok_or_else(|| DocError::Store(format!("404 page {} not found", page.id)))?;

        if version != stored.version + 1 {
            return Err(DocError::Store(format!(
                "409 version conflict: page {} is at version {}, got {}",
                page.id, stored.version, version
            )));
        }

        stored.title = title.to_string();
        stored.body = body.to_string();
        stored.version = version;
        Ok(stored.clone())
    }

    async fn add_labels(&self, id: &PageId, labels: &[String]) -> Result<()> {
        self.check_available()?;
        if self.fail_labels.load(Ordering::SeqCst) {
            return Err(DocError::Store("403 not permitted to add labels".to_string()));
        }
        let mut entry = self.labels.entry(id.clone()).or_default();
        for label in labels {
            if !entry.contains(label) {
                entry.push(label.clone());
            }
        }
        Ok(())
    }

    async fn upload_attachment(
        &self,
        id: &PageId,
        file_name: &str,
        _media_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String> {
        self.check_available()?;
        if !self.pages.contains_key(id) {
            return Err(DocError::Store(format!("404 page {} not found", id)));
        }
        let mut entry = self.attachments.entry(id.clone()).or_default();
        if !entry.iter().any(|f| f == file_name) {
            entry.push(file_name.to_string());
        }
        Ok(file_name.to_string())
    }

    async fn test_connection(&self) -> Result<String> {
        self.check_available()?;
        Ok("in-memory".to_string())
    }

    async fn get_space_info(&self, space_key: &str) -> Result<SpaceInfo> {
        self.check_available()?;
        Ok(SpaceInfo {
            key: space_key.to_string(),
            name: space_key.to_string(),
            url: None,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryPageStore::new();
        let created = store
            .create(NewPage {
                space_key: "DOC",
                title: "Guide",
                body: "<p>v1</p>",
                parent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(created.version, 1);

        let found = store.find_by_title("DOC", "Guide").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_title("OTHER", "Guide").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_requires_next_version() {
        let store = InMemoryPageStore::new();
        let page = store
            .create(NewPage {
                space_key: "DOC",
                title: "Guide",
                body: "v1",
                parent_id: None,
            })
            .await
            .unwrap();

        let err = store.update(&page, "Guide", "v2", 3).await.unwrap_err();
        assert!(err.to_string().contains("version conflict"));

        let updated = store.update(&page, "Guide", "v2", 2).await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(store.page(&page.id).unwrap().body, "v2");
    }

    #[tokio::test]
    async fn test_labels_deduplicated() {
        let store = InMemoryPageStore::new();
        let id = PageId::new("1");
        let labels = vec!["user-guide".to_string()];
        store.add_labels(&id, &labels).await.unwrap();
        store.add_labels(&id, &labels).await.unwrap();
        assert_eq!(store.labels(&id), labels);
    }
}
