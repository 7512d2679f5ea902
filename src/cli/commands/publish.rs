//! Publish Command
//!
//! Upserts an already generated guide into Confluence.

use std::path::PathBuf;

use tokio::runtime::Runtime;

use crate::ai::image::load_images;
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::config::UpdateMode;
use crate::publish::PublishOutcome;
use crate::types::{DocError, Result, ResultExt};

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub file: PathBuf,
    pub title: String,
    pub parent: Option<String>,
    pub images: Vec<String>,
    pub update_mode: Option<UpdateMode>,
    pub dry_run: bool,
}

pub fn run(config_path: Option<PathBuf>, options: PublishOptions) -> Result<()> {
    let ctx = CommandContext::load(config_path.as_deref())?;
    let out = Output::new();

    let body = std::fs::read_to_string(&options.file)
        .with_context(format!("reading {}", options.file.display()))?;
    let images = load_images(&options.images);
    for (path, reason) in &images.rejected {
        out.warning(&format!("Skipping {}: {}", path, reason));
    }

    let mut publisher = ctx.publisher(options.dry_run)?;
    if let Some(mode) = options.update_mode {
        publisher = publisher.with_update_mode(mode);
    }
    let parent = ctx.parent_title(options.parent.clone());

    out.header(&format!("Publishing '{}'", options.title));
    out.field("Space", publisher.space_key());

    let rt = Runtime::new()?;
    let outcome = rt.block_on(async {
        if images.is_empty() {
            publisher.upsert(&options.title, &body, parent.as_deref()).await
        } else {
            publisher
                .publish_with_images(&options.title, &body, parent.as_deref(), &images.images)
                .await
        }
    });

    report_outcome(&out, &outcome, options.dry_run)
}

/// Print a publish outcome; an unsuccessful outcome becomes an error
pub fn report_outcome(out: &Output, outcome: &PublishOutcome, dry_run: bool) -> Result<()> {
    if !outcome.success {
        let reason = outcome.error.clone().unwrap_or_default();
        return Err(DocError::Store(reason));
    }

    let action = outcome
        .action
        .map(|a| a.to_string())
        .unwrap_or_default();
    let prefix = if dry_run { "[dry run] " } else { "" };
    out.success(&format!("{}Page {} ({})", prefix, outcome.title, action));
    if let Some(id) = &outcome.page_id {
        out.field("Page ID", id);
    }
    if let Some(url) = &outcome.page_url {
        out.field("URL", url);
    }
    Ok(())
}
