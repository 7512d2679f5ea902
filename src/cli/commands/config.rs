//! Config Command
//!
//! Usage:
//!   dashdoc config show [-f toml|json|yaml]
//!   dashdoc config path
//!   dashdoc config init [-g] [--force]

use std::path::PathBuf;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Print the effective configuration; secrets are never serialized
pub fn show(config_path: Option<PathBuf>, format: &str) -> Result<()> {
    let ctx = CommandContext::load(config_path.as_deref())?;
    println!("{}", ConfigLoader::render(&ctx.config, format)?);
    Ok(())
}

pub fn path() -> Result<()> {
    let out = Output::new();
    out.section("Configuration files (lowest to highest precedence)");

    match ConfigLoader::global_config_path() {
        Some(global) => out.field("Global", describe(&global)),
        None => out.field("Global", "unavailable (no HOME)"),
    }
    out.field("Project", describe(&ConfigLoader::project_config_path()));
    out.field("Environment", "CONFLUENCE_*, REDSHIFT_*, DASHDOC_*");
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    Output::new().success(&format!("Configuration at {}", path.display()));
    Ok(())
}

fn describe(path: &std::path::Path) -> String {
    let state = if path.exists() { "" } else { " (not found)" };
    format!("{}{}", path.display(), state)
}
