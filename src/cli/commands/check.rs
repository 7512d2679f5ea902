//! Check Command
//!
//! Verifies credentials and connectivity for every configured service.

use std::path::PathBuf;

use tokio::runtime::Runtime;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::publish::{ConfluenceClient, PageStore};
use crate::types::{DocError, Result};

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let ctx = CommandContext::load(config_path.as_deref())?;
    let out = Output::new();
    let rt = Runtime::new()?;
    let mut failures = 0;

    out.section("LLM");
    match ctx.provider() {
        Ok(provider) => {
            out.field("Provider", provider.name());
            out.field("Model", provider.model());
            match rt.block_on(provider.health_check()) {
                Ok(true) => out.success("Model reachable"),
                _ => {
                    failures += 1;
                    out.error("Model not reachable");
                }
            }
        }
        Err(e) => {
            failures += 1;
            out.error(&e.to_string());
        }
    }

    out.section("Confluence");
    match ConfluenceClient::new(&ctx.config.confluence) {
        Ok(client) => {
            out.field("URL", client.base_url());
            let space = ctx.config.confluence.space_key.clone().unwrap_or_default();
            let checked = rt.block_on(async {
                let user = client.test_connection().await?;
                let info = client.get_space_info(&space).await?;
                Ok::<_, DocError>((user, info))
            });
            match checked {
                Ok((user, info)) => {
                    out.success(&format!("Authenticated as {}", user));
                    out.success(&format!("Space {} ({})", info.key, info.name));
                }
                Err(e) => {
                    failures += 1;
                    out.error(&e.to_string());
                    if let Some(hint) = e.hint() {
                        out.info(hint);
                    }
                }
            }
        }
        Err(e) => {
            failures += 1;
            out.error(&e.to_string());
        }
    }

    out.section("Redshift");
    let missing = ctx.config.redshift.missing_fields();
    if missing.is_empty() {
        out.success("Connection settings present");
    } else {
        out.warning(&format!("Not configured: {}", missing.join(", ")));
    }

    if failures > 0 {
        return Err(DocError::Config(format!("{} check(s) failed", failures)));
    }
    Ok(())
}
