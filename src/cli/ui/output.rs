use console::style;

use crate::quality::{Assessment, QualityReport};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        println!("  {:<14} {}", style(format!("{}:", label)).dim(), value);
    }

    pub fn quality(&self, report: &QualityReport) {
        self.section("Quality Assessment");
        let score = format!("{}/100 ({})", report.score, report.assessment);
        let score = match report.assessment {
            Assessment::Excellent | Assessment::Good => style(score).green(),
            Assessment::Fair => style(score).yellow(),
            Assessment::NeedsImprovement => style(score).red(),
        };
        self.field("Score", score);
        self.field("Length", format!("{} characters", report.length));

        for strength in &report.strengths {
            self.success(strength);
        }
        for issue in &report.issues {
            self.warning(issue);
        }
        for recommendation in &report.recommendations {
            self.info(recommendation);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
