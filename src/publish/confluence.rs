//! Confluence Cloud client
//!
//! REST API v1 under `{base}/wiki/rest/api`, basic auth with the account
//! e-mail and an API token. Page bodies are sent in storage format.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::store::{NewPage, PageStore, RemotePage, SpaceInfo};
use crate::config::ConfluenceConfig;
use crate::types::{DocError, PageId, Result};

pub struct ConfluenceClient {
    /// `https://site.atlassian.net/wiki`
    base_url: String,
    username: String,
    api_token: SecretString,
    client: reqwest::Client,
}

impl std::fmt::Debug for ConfluenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluenceClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl ConfluenceClient {
    /// Build from configuration; every missing setting is reported at once
    pub fn new(config: &ConfluenceConfig) -> Result<Self> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(DocError::Config(format!(
                "Missing Confluence configuration: {}",
                missing.join(", ")
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocError::Store(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: wiki_base(config.url.as_deref().unwrap_or_default()),
            username: config.username.clone().unwrap_or_default(),
            api_token: SecretString::from(config.api_token.clone().unwrap_or_default()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/rest/api/{}", self.base_url, path.trim_start_matches('/'));
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(self.api_token.expose_secret()))
            .header("Accept", "application/json")
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| DocError::Store(format!("{} failed: {}", action, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DocError::Store(format!(
            "{} failed ({}): {}",
            action,
            status.as_u16(),
            truncate(&body, 300)
        )))
    }

    async fn read_page(&self, response: Response, space_key: &str) -> Result<RemotePage> {
        let content: Content = response
            .json()
            .await
            .map_err(|e| DocError::Store(format!("Unexpected page payload: {}", e)))?;
        Ok(content.into_page(space_key))
    }
}

#[async_trait]
impl PageStore for ConfluenceClient {
    async fn find_by_title(&self, space_key: &str, title: &str) -> Result<Option<RemotePage>> {
        let builder = self.request(Method::GET, "content").query(&[
            ("title", title),
            ("spaceKey", space_key),
            ("expand", "version,ancestors"),
        ]);
        let response = self.send(builder, "Page search").await?;
        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| DocError::Store(format!("Unexpected search payload: {}", e)))?;

        let page = results
            .results
            .into_iter()
            .next()
            .map(|content| content.into_page(space_key));
        match &page {
            Some(p) => debug!("Found page '{}' (id {}, v{})", title, p.id, p.version),
            None => debug!("No page titled '{}' in {}", title, space_key),
        }
        Ok(page)
    }

    async fn create(&self, page: NewPage<'_>) -> Result<RemotePage> {
        let mut payload = json!({
            "type": "page",
            "title": page.title,
            "space": {"key": page.space_key},
            "body": {"storage": {"value": page.body, "representation": "storage"}},
        });
        if let Some(parent) = page.parent_id {
            payload["ancestors"] = json!([{"id": parent.as_str()}]);
        }

        let builder = self.request(Method::POST, "content").json(&payload);
        let response = self.send(builder, "Page creation").await?;
        let created = self.read_page(response, page.space_key).await?;
        info!("Created page '{}' (id {})", created.title, created.id);
        Ok(created)
    }

    async fn update(
        &self,
        page: &RemotePage,
        title: &str,
        body: &str,
        version: u32,
    ) -> Result<RemotePage> {
        let payload = json!({
            "id": page.id.as_str(),
            "type": "page",
            "title": title,
            "space": {"key": page.space_key},
            "body": {"storage": {"value": body, "representation": "storage"}},
            "version": {"number": version},
        });

        let builder = self
            .request(Method::PUT, &format!("content/{}", page.id))
            .json(&payload);
        let response = self.send(builder, "Page update").await?;
        let updated = self.read_page(response, &page.space_key).await?;
        info!("Updated page '{}' to v{}", updated.title, updated.version);
        Ok(updated)
    }

    async fn add_labels(&self, id: &PageId, labels: &[String]) -> Result<()> {
        let payload: Vec<Value> = labels
            .iter()
            .map(|name| json!({"prefix": "global", "name": name}))
            .collect();
        let builder = self
            .request(Method::POST, &format!("content/{}/label", id))
            .json(&payload);
        self.send(builder, "Labeling").await?;
        Ok(())
    }

    async fn upload_attachment(
        &self,
        id: &PageId,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(media_type)
            .map_err(|e| DocError::Store(format!("Invalid media type {}: {}", media_type, e)))?;
        let form = Form::new()
            .part("file", part)
            .text("minorEdit", "true");

        // PUT creates the attachment or adds a new version of an existing one
        let builder = self
            .request(Method::PUT, &format!("content/{}/child/attachment", id))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form);
        self.send(builder, "Attachment upload").await?;
        debug!("Uploaded attachment {} to page {}", file_name, id);
        Ok(file_name.to_string())
    }

    async fn test_connection(&self) -> Result<String> {
        let response = self
            .send(self.request(Method::GET, "user/current"), "Connection test")
            .await?;
        let user: CurrentUser = response
            .json()
            .await
            .map_err(|e| DocError::Store(format!("Unexpected user payload: {}", e)))?;
        Ok(user.display_name.unwrap_or_else(|| self.username.clone()))
    }

    async fn get_space_info(&self, space_key: &str) -> Result<SpaceInfo> {
        let response = self
            .send(
                self.request(Method::GET, &format!("space/{}", space_key)),
                "Space lookup",
            )
            .await?;
        let space: Space = response
            .json()
            .await
            .map_err(|e| DocError::Store(format!("Unexpected space payload: {}", e)))?;
        Ok(SpaceInfo {
            key: space.key,
            name: space.name,
            url: space.links.and_then(|l| l.full_url()),
        })
    }

    fn name(&self) -> &str {
        "confluence"
    }
}

/// Normalize a site URL to its `/wiki` root
fn wiki_base(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/wiki") {
        trimmed.to_string()
    } else {
        format!("{}/wiki", trimmed)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

// Response types

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    id: String,
    title: String,
    version: Option<Version>,
    space: Option<SpaceRef>,
    body: Option<Body>,
    #[serde(default)]
    ancestors: Vec<Ancestor>,
    #[serde(rename = "_links")]
    links: Option<Links>,
}

impl Content {
    fn into_page(self, space_key: &str) -> RemotePage {
        RemotePage {
            id: PageId::new(self.id),
            title: self.title,
            space_key: self
                .space
                .map(|s| s.key)
                .unwrap_or_else(|| space_key.to_string()),
            version: self.version.map(|v| v.number).unwrap_or(1),
            body: self
                .body
                .and_then(|b| b.storage)
                .map(|s| s.value)
                .unwrap_or_default(),
            parent_id: self.ancestors.last().map(|a| PageId::new(a.id.clone())),
            url: self.links.and_then(|l| l.full_url()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Version {
    number: u32,
}

#[derive(Debug, Deserialize)]
struct SpaceRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct Body {
    storage: Option<Storage>,
}

#[derive(Debug, Deserialize)]
struct Storage {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Ancestor {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Links {
    base: Option<String>,
    webui: Option<String>,
}

impl Links {
    fn full_url(self) -> Option<String> {
        let webui = self.webui?;
        Some(match self.base {
            Some(base) => format!("{}{}", base, webui),
            None => webui,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Space {
    key: String,
    name: String,
    #[serde(rename = "_links")]
    links: Option<Links>,
}
