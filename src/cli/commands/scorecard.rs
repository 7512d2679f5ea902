//! Scorecard Command
//!
//! Data-direct analysis: fetches metric rows from an export file or the
//! warehouse, computes the analytics report and saves it as JSON.

use std::path::PathBuf;

use tokio::runtime::Runtime;

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::pipeline::ArtifactStore;
use crate::scorecard::{MetricSource, REPORT_PREFIX, RedshiftSource, ScorecardReport, file_source};
use crate::types::{DocError, Result};

#[derive(Debug, Clone, Default)]
pub struct ScorecardOptions {
    /// CSV or JSON export; the warehouse is queried when absent
    pub input: Option<PathBuf>,
    /// Rule-based recommendations only
    pub no_llm: bool,
    /// Print the report as JSON instead of the markdown summary
    pub json: bool,
}

pub fn run(config_path: Option<PathBuf>, options: ScorecardOptions) -> Result<()> {
    let ctx = CommandContext::load(config_path.as_deref())?;
    let out = Output::new();

    let source: Box<dyn MetricSource> = match &options.input {
        Some(path) => file_source(path)?,
        None => Box::new(RedshiftSource::new(&ctx.config.redshift)?),
    };
    let recommender = ctx.recommender(!options.no_llm);

    let rt = Runtime::new()?;
    let report = rt.block_on(async {
        let rows = source.fetch().await?;
        out.info(&format!("Retrieved {} rows from {}", rows.len(), source.describe()));
        Ok::<_, DocError>(
            ScorecardReport::build(source.describe(), &rows, &recommender).await,
        )
    })?;

    let path = ArtifactStore::new(&ctx.config.output).save_report(REPORT_PREFIX, &report)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", report.executive_summary());
    }
    out.success(&format!("Report saved to {}", path.display()));
    Ok(())
}
