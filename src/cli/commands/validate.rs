//! Validate Command
//!
//! Scores a saved guide against the documentation rubric.

use std::path::{Path, PathBuf};

use crate::cli::ui::Output;
use crate::quality::DocumentValidator;
use crate::types::{Result, ResultExt};

pub fn run(file: &Path, report: Option<PathBuf>, format: &str) -> Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(format!("reading {}", file.display()))?;
    let quality = DocumentValidator::new().validate(&content);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&quality)?),
        "markdown" => println!("{}", quality.to_markdown()),
        _ => {
            let out = Output::new();
            out.header(&format!("Validating {}", file.display()));
            out.quality(&quality);
        }
    }

    if let Some(path) = report {
        std::fs::write(&path, quality.to_markdown())
            .with_context(format!("writing {}", path.display()))?;
        Output::new().info(&format!("Report saved to {}", path.display()));
    }

    Ok(())
}
