//! Document Quality Validation
//!
//! Deterministic rubric for generated guides. Each check adds a fixed
//! number of points; the total is clipped to 100.
//!
//! | Check | Points |
//! |-------|--------|
//! | All required section headers | 20 |
//! | Length > 15000 chars (or >= 2000) | 15 (10) |
//! | "Metrics Reported" | 15 |
//! | "Interactive Controls" or "Drill-Down" | 15 |
//! | >= 3 business keywords | 15 |
//! | >= 2 action keywords | 10 |
//! | `<h2`, `<h3` and `<strong>` | 10 |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::rubric;

/// Overall verdict derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Assessment {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::Fair => write!(f, "Fair"),
            Self::NeedsImprovement => write!(f, "Needs Improvement"),
        }
    }
}

/// Result of validating one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0..=100
    pub score: u32,
    pub assessment: Assessment,
    pub issues: Vec<String>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    pub missing_sections: Vec<String>,
    /// Length in characters
    pub length: usize,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        format!(
            "Quality: {}/100 ({}) | {} issue(s) | {} chars",
            self.score,
            self.assessment,
            self.issues.len(),
            self.length
        )
    }

    /// Format as markdown for the console or a saved report
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Documentation Quality Report\n\n");
        md.push_str(&format!(
            "**Score:** {}/100 ({})\n\n",
            self.score, self.assessment
        ));

        let sections = [
            ("Strengths", "✅", &self.strengths),
            ("Issues", "❌", &self.issues),
            ("Recommendations", "💡", &self.recommendations),
        ];
        for (title, marker, items) in sections {
            if items.is_empty() {
                continue;
            }
            md.push_str(&format!("## {}\n\n", title));
            for item in items {
                md.push_str(&format!("- {} {}\n", marker, item));
            }
            md.push('\n');
        }

        md
    }
}

/// Scores generated guides against the rubric
#[derive(Debug, Clone, Default)]
pub struct DocumentValidator;

impl DocumentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Score `content`; never fails
    pub fn validate(&self, content: &str) -> QualityReport {
        let mut score = 0u32;
        let mut issues = Vec::new();
        let mut strengths = Vec::new();
        let mut recommendations = Vec::new();

        // Structure
        let missing_sections: Vec<String> = rubric::REQUIRED_SECTIONS
            .iter()
            .filter(|section| !content.contains(*section))
            .map(|section| section.to_string())
            .collect();
        if missing_sections.is_empty() {
            score += rubric::SECTIONS_POINTS;
            strengths.push("All required sections present".to_string());
        } else {
            issues.push(format!(
                "Missing required sections: {}",
                missing_sections.join(", ")
            ));
            recommendations.push("Add the missing sections to complete the guide".to_string());
        }

        // Length
        let length = content.chars().count();
        if length < rubric::MIN_LENGTH {
            issues.push(format!(
                "Document too short ({} characters, minimum {})",
                length,
                rubric::MIN_LENGTH
            ));
            recommendations.push("Expand explanations for each dashboard view".to_string());
        } else if length > rubric::COMPREHENSIVE_LENGTH {
            score += rubric::COMPREHENSIVE_POINTS;
            strengths.push(format!("Comprehensive documentation ({} characters)", length));
        } else {
            score += rubric::ADEQUATE_LENGTH_POINTS;
            strengths.push(format!("Adequate length ({} characters)", length));
        }

        // Metrics
        if content.contains("Metrics Reported") {
            score += rubric::METRICS_POINTS;
            strengths.push("Metrics are documented".to_string());
        } else {
            issues.push("No 'Metrics Reported' lists".to_string());
            recommendations.push("List the metrics reported in each view".to_string());
        }

        // Interactivity
        if content.contains("Interactive Controls") || content.contains("Drill-Down") {
            score += rubric::CONTROLS_POINTS;
            strengths.push("Interactive controls are explained".to_string());
        } else {
            issues.push("Interactive controls are not described".to_string());
            recommendations.push("Describe filters, controls and drill-down paths".to_string());
        }

        // Business language
        let lower = content.to_lowercase();
        let business_hits = distinct_hits(&lower, &rubric::BUSINESS_KEYWORDS);
        if business_hits >= rubric::MIN_BUSINESS_HITS {
            score += rubric::BUSINESS_POINTS;
            strengths.push(format!("Business context ({} key terms)", business_hits));
        } else {
            issues.push("Limited business context".to_string());
            recommendations.push("Explain business impact and KPIs".to_string());
        }

        // Actionable guidance
        let action_hits = distinct_hits(&lower, &rubric::ACTION_KEYWORDS);
        if action_hits >= rubric::MIN_ACTION_HITS {
            score += rubric::ACTION_POINTS;
            strengths.push("Actionable usage instructions".to_string());
        } else {
            issues.push("Few actionable instructions".to_string());
            recommendations.push("Add step-by-step instructions (click, select, filter)".to_string());
        }

        // Formatting
        if content.contains("<h2") && content.contains("<h3") && content.contains("<strong>") {
            score += rubric::FORMATTING_POINTS;
            strengths.push("Well-structured HTML formatting".to_string());
        } else {
            issues.push("Incomplete HTML structure (<h2>, <h3>, <strong>)".to_string());
        }

        let score = score.min(rubric::MAX_SCORE);

        QualityReport {
            score,
            assessment: Assessment::from_score(score),
            issues,
            strengths,
            recommendations,
            missing_sections,
            length,
        }
    }
}

/// Number of keywords that occur at least once in `haystack`
fn distinct_hits(haystack: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| haystack.contains(*k)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// A guide that satisfies every rubric check
    fn complete_guide(target_len: usize) -> String {
        let mut doc = String::from(
            "<h2>Executive Summary</h2><p>Business performance, revenue and customer growth KPI.</p>\n\
             <h2>Objective</h2>\n<h2>Dashboard Views</h2>\n\
             <h3>Queue</h3><strong>Metrics Reported</strong>\n\
             <h2>Interactive Controls</h2><p>Click a bar, select a region, filter by month.</p>\n\
             <h2>How to Use This Dashboard</h2>\n<h2>Key Insights</h2>\n\
             <h2>Data Quality and Freshness</h2>\n",
        );
        while doc.chars().count() <= target_len {
            doc.push_str("<p>Navigate to each view to review the trend.</p>\n");
        }
        doc
    }

    #[test]
    fn test_empty_document() {
        let report = DocumentValidator::new().validate("");
        assert_eq!(report.score, 0);
        assert_eq!(report.assessment, Assessment::NeedsImprovement);
        assert!(report.issues.iter().any(|i| i.contains("too short")));
        assert_eq!(report.missing_sections.len(), 7);
    }

    #[test]
    fn test_comprehensive_document_scores_100() {
        let report = DocumentValidator::new().validate(&complete_guide(15_000));
        assert_eq!(report.score, 100);
        assert_eq!(report.assessment, Assessment::Excellent);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_adequate_length_scores_95() {
        let report = DocumentValidator::new().validate(&complete_guide(2_000));
        assert!(report.length <= 15_000);
        assert_eq!(report.score, 95);
    }

    #[test]
    fn test_missing_sections_named() {
        let doc = complete_guide(2_000).replace("Key Insights", "Takeaways");
        let report = DocumentValidator::new().validate(&doc);
        assert_eq!(report.missing_sections, ["Key Insights"]);
        assert!(report.issues[0].contains("Key Insights"));
        assert_eq!(report.score, 75);
    }

    #[test]
    fn test_keywords_counted_once_case_insensitive() {
        let doc = "REVENUE revenue Revenue customer";
        assert_eq!(distinct_hits(&doc.to_lowercase(), &rubric::BUSINESS_KEYWORDS), 2);

        let report = DocumentValidator::new().validate(doc);
        assert!(report.issues.iter().any(|i| i.contains("business context")));
    }

    #[test]
    fn test_drill_down_counts_as_interactivity() {
        let report = DocumentValidator::new().validate("Use the Drill-Down on each bar");
        assert!(report.strengths.iter().any(|s| s.contains("Interactive")));
        assert_eq!(report.score, 15);
    }

    #[test]
    fn test_length_counts_characters() {
        let doc = "é".repeat(1_999);
        let report = DocumentValidator::new().validate(&doc);
        assert_eq!(report.length, 1_999);
        assert!(report.issues.iter().any(|i| i.contains("too short")));
    }

    #[test]
    fn test_assessment_bands() {
        assert_eq!(Assessment::from_score(80), Assessment::Excellent);
        assert_eq!(Assessment::from_score(79), Assessment::Good);
        assert_eq!(Assessment::from_score(60), Assessment::Good);
        assert_eq!(Assessment::from_score(59), Assessment::Fair);
        assert_eq!(Assessment::from_score(40), Assessment::Fair);
        assert_eq!(Assessment::from_score(39), Assessment::NeedsImprovement);
        assert_eq!(Assessment::NeedsImprovement.to_string(), "Needs Improvement");
    }

    #[test]
    fn test_markdown_lists_findings() {
        let report = DocumentValidator::new().validate("");
        let md = report.to_markdown();
        assert!(md.contains("**Score:** 0/100 (Needs Improvement)"));
        assert!(md.contains("## Issues"));
        assert!(!md.contains("## Strengths"));
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(content in ".{0,3000}") {
            let report = DocumentValidator::new().validate(&content);
            prop_assert!(report.score <= 100);
            prop_assert_eq!(report.assessment, Assessment::from_score(report.score));
        }

        #[test]
        fn prop_adding_text_never_removes_sections(extra in "[a-z ]{0,200}") {
            let base = complete_guide(2_000);
            let report = DocumentValidator::new().validate(&format!("{base}{extra}"));
            prop_assert!(report.missing_sections.is_empty());
        }
    }
}
