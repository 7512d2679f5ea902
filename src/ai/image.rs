//! Screenshot intake
//!
//! Validates dashboard screenshots against the size ceiling and format
//! whitelist and loads them into memory for the vision stage. Invalid
//! entries are reported, not fatal: the caller decides what an empty batch
//! means.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::constants::images::{MAX_FILE_SIZE, SUPPORTED_FORMATS};
use crate::types::{DocError, Result};

/// One image payload, in the order it will be shown to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// File name used for display and attachments
    pub name: String,
    /// Mime type from the supported-format whitelist
    pub media_type: String,
    pub bytes: Vec<u8>,
    /// Where the image was loaded from, if it came from disk
    pub source_path: Option<PathBuf>,
}

impl ImageInput {
    /// Build from in-memory bytes, checking size and format
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let media_type = media_type_for(&name).ok_or_else(|| DocError::Image {
            path: name.clone(),
            reason: unsupported_reason(&name),
        })?;

        if bytes.len() as u64 > MAX_FILE_SIZE {
            return Err(DocError::Image {
                path: name,
                reason: too_large_reason(bytes.len() as u64),
            });
        }

        Ok(Self {
            name,
            media_type: media_type.to_string(),
            bytes,
            source_path: None,
        })
    }

    /// Load and validate an image from disk
    pub fn load(raw_path: &str) -> Result<Self> {
        let cleaned = clean_path(raw_path);
        if cleaned.is_empty() {
            return Err(DocError::Image {
                path: raw_path.to_string(),
                reason: "no image path provided".to_string(),
            });
        }

        let path = PathBuf::from(cleaned);
        let image_err = |reason: String| DocError::Image {
            path: path.display().to_string(),
            reason,
        };

        let metadata = fs::metadata(&path).map_err(|_| image_err("file not found".to_string()))?;
        if !metadata.is_file() {
            return Err(image_err("not a regular file".to_string()));
        }
        if metadata.len() > MAX_FILE_SIZE {
            return Err(image_err(too_large_reason(metadata.len())));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(cleaned)
            .to_string();
        let media_type =
            media_type_for(&name).ok_or_else(|| image_err(unsupported_reason(&name)))?;

        let bytes = fs::read(&path)?;

        Ok(Self {
            name,
            media_type: media_type.to_string(),
            bytes,
            source_path: Some(path),
        })
    }

    /// Standard base64 encoding of the payload
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URI for providers that take images inline as URLs
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    /// Length of the base64 encoding without materializing it
    pub fn encoded_len(&self) -> usize {
        self.bytes.len().div_ceil(3) * 4
    }
}

/// Result of loading a list of paths: the valid images plus rejections
#[derive(Debug, Default)]
pub struct ImageBatch {
    pub images: Vec<ImageInput>,
    /// (path, reason) for each skipped entry
    pub rejected: Vec<(String, String)>,
}

impl ImageBatch {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load every path, keeping valid images in input order
pub fn load_images<S: AsRef<str>>(paths: &[S]) -> ImageBatch {
    let mut batch = ImageBatch::default();

    for raw in paths {
        match ImageInput::load(raw.as_ref()) {
            Ok(image) => {
                debug!("Loaded image {} ({} bytes)", image.name, image.bytes.len());
                batch.images.push(image);
            }
            Err(DocError::Image { path, reason }) => {
                warn!("Skipping image {}: {}", path, reason);
                batch.rejected.push((path, reason));
            }
            Err(e) => {
                warn!("Skipping image {}: {}", raw.as_ref(), e);
                batch.rejected.push((raw.as_ref().to_string(), e.to_string()));
            }
        }
    }

    batch
}

/// Supported images in `dir`, most recently modified first
pub fn find_recent_images(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();

    for (ext, _) in SUPPORTED_FORMATS {
        for case in [ext.to_string(), ext.to_uppercase()] {
            let pattern = dir.join(format!("*.{}", case));
            let pattern = pattern.to_string_lossy();
            let entries = glob::glob(&pattern)
                .map_err(|e| DocError::Config(format!("Invalid image pattern {}: {}", pattern, e)))?;

            for path in entries.flatten() {
                if found.iter().any(|(_, p)| p == &path) {
                    continue;
                }
                let modified = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                found.push((modified, path));
            }
        }
    }

    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(found.into_iter().take(limit).map(|(_, p)| p).collect())
}

/// Mime type for a file name, if its extension is supported
pub fn media_type_for(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .find(|(supported, _)| *supported == ext)
        .map(|(_, mime)| *mime)
}

/// Strip surrounding whitespace and quotes left by drag-and-drop
fn clean_path(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

fn too_large_reason(size: u64) -> String {
    format!(
        "file too large: {:.1}MB (max {}MB)",
        size as f64 / (1024.0 * 1024.0),
        MAX_FILE_SIZE / (1024 * 1024)
    )
}

fn unsupported_reason(name: &str) -> String {
    let supported: Vec<_> = SUPPORTED_FORMATS.iter().map(|(ext, _)| *ext).collect();
    format!(
        "unsupported format for {}; supported: {}",
        name,
        supported.join(", ")
    )
}
