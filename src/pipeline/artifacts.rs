//! Local artifacts
//!
//! Everything a run produces is written under one output directory:
//! the analysis sidecar, the guide page, copies of the screenshots, and
//! scorecard reports. File names carry a second-resolution timestamp.

use chrono::Local;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::analysis::AnalysisDocument;
use crate::ai::image::ImageInput;
use crate::config::OutputConfig;
use crate::constants::{artifacts as artifact_constants, images as image_constants};
use crate::types::{Result, ResultExt};

/// Writes run outputs under a single root directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    copy_images: bool,
}

impl ArtifactStore {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            root: config.dir.clone(),
            copy_images: config.copy_images,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(image_constants::OUTPUT_SUBDIR)
    }

    /// `{title}_{timestamp}_analysis.{json|txt}`
    pub fn save_analysis(&self, title: &str, analysis: &AnalysisDocument) -> Result<PathBuf> {
        let content = analysis.prompt_text()?;
        let name = format!(
            "{}_{}_analysis.{}",
            clean_title(title),
            timestamp(),
            analysis.extension()
        );
        self.write(&name, &content)
    }

    /// `{title}_{timestamp}.html`
    pub fn save_document(&self, title: &str, page: &str) -> Result<PathBuf> {
        let name = format!("{}_{}.html", clean_title(title), timestamp());
        self.write(&name, page)
    }

    /// Pretty JSON under `{prefix}_{timestamp}.json`
    pub fn save_report<T: Serialize>(&self, prefix: &str, report: &T) -> Result<PathBuf> {
        let content = serde_json::to_string_pretty(report)?;
        self.write(&format!("{}_{}.json", prefix, timestamp()), &content)
    }

    /// Copy screenshots into the images directory; failures are skipped
    ///
    /// Screenshots sharing a file name get `_2`, `_3`, ... before the
    /// extension so none overwrites another.
    pub fn copy_images(&self, images: &[ImageInput]) -> Result<Vec<PathBuf>> {
        if !self.copy_images {
            return Ok(Vec::new());
        }

        let dir = self.images_dir();
        fs::create_dir_all(&dir).with_context(format!("creating {}", dir.display()))?;

        let mut copied = Vec::new();
        let mut used = HashSet::new();
        for image in images {
            let dest = dir.join(unique_name(&image.name, &mut used));
            let outcome = match &image.source_path {
                Some(source) => fs::copy(source, &dest).map(|_| ()),
                None => fs::write(&dest, &image.bytes),
            };
            match outcome {
                Ok(()) => {
                    debug!("Copied image {}", image.name);
                    copied.push(dest);
                }
                Err(e) => warn!("Could not copy {}: {}", image.name, e),
            }
        }

        Ok(copied)
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(format!("creating {}", self.root.display()))?;
        let path = self.root.join(name);
        fs::write(&path, content).with_context(format!("writing {}", path.display()))?;
        debug!("Saved {}", path.display());
        Ok(path)
    }
}

/// File-name-safe title: alphanumerics, space, `-`, `_`; spaces become `_`
pub fn clean_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let kept = kept.trim();

    if kept.is_empty() {
        artifact_constants::DEFAULT_TITLE.to_string()
    } else {
        kept.replace(' ', "_")
    }
}

fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = name.to_string();
    let mut counter = 2;
    while used.contains(&candidate) {
        candidate = format!("{}_{}{}", stem, counter, extension);
        counter += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn timestamp() -> String {
    Local::now()
        .format(artifact_constants::FILE_TIMESTAMP_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::VisualAnalyst;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ArtifactStore {
        ArtifactStore::new(&OutputConfig {
            dir: dir.path().join("outputs"),
            copy_images: true,
        })
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Care Scorecard: Q1/2025"), "Care_Scorecard_Q12025");
        assert_eq!(clean_title("  sales-kpi_v2  "), "sales-kpi_v2");
        assert_eq!(clean_title("!!!"), "dashboard");
        assert_eq!(clean_title(""), "dashboard");
    }

    #[test]
    fn test_analysis_extension_follows_variant() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let structured = VisualAnalyst::parse(r#"{"dashboard_purpose": "Sales"}"#);
        let path = store.save_analysis("Sales Board", &structured).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Sales_Board_"));
        assert!(name.ends_with("_analysis.json"));
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["dashboard_purpose"], "Sales");

        let extended = VisualAnalyst::parse(
            r#"{"sections": [{"section_name": "Queue", "drill_paths": ["region"]}]}"#,
        );
        let path = store.save_analysis("Sales Board", &extended).unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["sections"][0]["drill_paths"][0], "region");
        assert!(saved.get("dashboard_purpose").is_none());

        let raw = AnalysisDocument::Raw("plain notes".to_string());
        let path = store.save_analysis("Sales Board", &raw).unwrap();
        assert!(path.to_string_lossy().ends_with("_analysis.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "plain notes");
    }

    #[test]
    fn test_save_document_and_report() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let path = store.save_document("", "<h1>Guide</h1>").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("dashboard_") && name.ends_with(".html"));

        let path = store
            .save_report("scorecard_analysis", &serde_json::json!({"ok": true}))
            .unwrap();
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("scorecard_analysis_")
        );
    }

    #[test]
    fn test_copy_images() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("queue.png");
        fs::write(&source, b"png").unwrap();

        let image = ImageInput::load(source.to_str().unwrap()).unwrap();
        let in_memory = ImageInput::from_bytes("inline.jpg", b"jpg".to_vec()).unwrap();

        let store = store(&dir);
        let copied = store.copy_images(&[image, in_memory]).unwrap();
        assert_eq!(copied.len(), 2);
        assert_eq!(fs::read(store.images_dir().join("queue.png")).unwrap(), b"png");
        assert_eq!(fs::read(store.images_dir().join("inline.jpg")).unwrap(), b"jpg");

        let disabled = ArtifactStore::new(&OutputConfig {
            dir: dir.path().join("other"),
            copy_images: false,
        });
        assert!(disabled.copy_images(&[]).unwrap().is_empty());
        assert!(!disabled.images_dir().exists());
    }

    #[test]
    fn test_copy_images_with_same_name_from_different_dirs() {
        let dir = TempDir::new().unwrap();
        let mut images = Vec::new();
        for (sub, bytes) in [("monday", b"one"), ("tuesday", b"two"), ("friday", b"tre")] {
            let folder = dir.path().join(sub);
            fs::create_dir_all(&folder).unwrap();
            let source = folder.join("queue.png");
            fs::write(&source, bytes).unwrap();
            images.push(ImageInput::load(source.to_str().unwrap()).unwrap());
        }

        let store = store(&dir);
        let copied = store.copy_images(&images).unwrap();
        let names: Vec<_> = copied
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["queue.png", "queue_2.png", "queue_3.png"]);
        assert_eq!(fs::read(store.images_dir().join("queue.png")).unwrap(), b"one");
        assert_eq!(fs::read(store.images_dir().join("queue_2.png")).unwrap(), b"two");
        assert_eq!(fs::read(store.images_dir().join("queue_3.png")).unwrap(), b"tre");
    }
}
