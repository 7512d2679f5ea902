//! Document Command
//!
//! Screenshots in, user guide out: runs both pipeline stages, saves the
//! artifacts, prints the quality assessment and optionally publishes.

use std::path::PathBuf;

use tokio::runtime::Runtime;

use crate::ai::image::{ImageInput, find_recent_images, load_images};
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::pipeline::DocumentationPipeline;
use crate::types::{DocError, Result};

/// Default title when none is given
const DEFAULT_TITLE: &str = "Dashboard";

#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Explicit screenshot paths
    pub images: Vec<String>,
    /// Directory scanned for the most recent screenshots
    pub dir: Option<PathBuf>,
    /// How many recent screenshots to take from `dir`
    pub recent: usize,
    pub title: Option<String>,
    pub publish: bool,
    /// Publish into a process-local store instead of Confluence
    pub dry_run: bool,
    pub parent: Option<String>,
    /// Upload screenshots as attachments when publishing
    pub attach_images: bool,
}

pub fn run(config_path: Option<PathBuf>, options: DocumentOptions) -> Result<()> {
    let ctx = CommandContext::load(config_path.as_deref())?;
    let out = Output::new();

    let images = collect_images(&options, &out)?;
    if images.is_empty() {
        return Err(DocError::NoValidImages);
    }
    let title = options
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    out.header(&format!("Documenting '{}'", title));
    out.field("Screenshots", images.len());

    let provider = ctx.provider()?;
    let pipeline = DocumentationPipeline::new(provider, &ctx.config);

    let rt = Runtime::new()?;
    let result = rt.block_on(pipeline.run(&images, &title))?;

    out.success(&format!("Guide generated in {}s", result.duration_secs));
    out.field("Analysis", result.analysis_path.display());
    out.field("Guide", result.document_path.display());
    if !result.copied_images.is_empty() {
        out.field("Images", pipeline.artifacts().images_dir().display());
    }
    out.quality(&result.quality);

    if !options.publish && !options.dry_run {
        return Ok(());
    }

    out.section("Publishing");
    let publisher = ctx.publisher(options.dry_run)?;
    let parent = ctx.parent_title(options.parent.clone());
    let outcome = rt.block_on(async {
        if options.attach_images {
            publisher
                .publish_with_images(&title, &result.page, parent.as_deref(), &images)
                .await
        } else {
            publisher.upsert(&title, &result.page, parent.as_deref()).await
        }
    });

    super::publish::report_outcome(&out, &outcome, options.dry_run)
}

fn collect_images(options: &DocumentOptions, out: &Output) -> Result<Vec<ImageInput>> {
    let mut paths = options.images.clone();
    if let Some(dir) = &options.dir {
        let recent = find_recent_images(dir, options.recent.max(1))?;
        out.info(&format!(
            "Found {} recent screenshot(s) in {}",
            recent.len(),
            dir.display()
        ));
        paths.extend(recent.iter().map(|p| p.display().to_string()));
    }

    let batch = load_images(&paths);
    for (path, reason) in &batch.rejected {
        out.warning(&format!("Skipping {}: {}", path, reason));
    }
    Ok(batch.images)
}
