//! Scorecard analysis report

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::recommend::Recommender;
use super::stats::{
    AggregateSummary, Analysis, Anomaly, PerformanceReport, TrendReport, detect_anomalies,
    performance, summarize, trend,
};
use crate::constants::analytics::PROMPT_TOP_REGIONS;
use crate::types::RawMetricRow;

/// Recommendations shown in the executive summary
const SUMMARY_RECOMMENDATIONS: usize = 5;

/// All analytics views over one table, as saved to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardReport {
    pub source: String,
    pub data_summary: Analysis<AggregateSummary>,
    pub trend_analysis: Analysis<TrendReport>,
    pub performance_insights: Analysis<PerformanceReport>,
    pub anomaly_detection: Analysis<Vec<Anomaly>>,
    pub recommendations: Vec<String>,
    pub analysis_timestamp: DateTime<Local>,
}

impl ScorecardReport {
    pub async fn build(
        source: impl Into<String>,
        rows: &[RawMetricRow],
        recommender: &Recommender,
    ) -> Self {
        Self {
            source: source.into(),
            data_summary: summarize(rows),
            trend_analysis: trend(rows),
            performance_insights: performance(rows),
            anomaly_detection: detect_anomalies(rows),
            recommendations: recommender.recommend(rows).await,
            analysis_timestamp: Local::now(),
        }
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomaly_detection.ready().map_or(0, Vec::len)
    }

    /// Markdown digest of the report
    pub fn executive_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Executive Scorecard Summary\n");
        let _ = writeln!(
            out,
            "**Analysis Date:** {}",
            self.analysis_timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "**Source:** {}\n", self.source);

        let (Some(summary), Some(trend), Some(performance)) = (
            self.data_summary.ready(),
            self.trend_analysis.ready(),
            self.performance_insights.ready(),
        ) else {
            let _ = writeln!(out, "No data available.");
            return out;
        };

        let _ = writeln!(out, "## Key Metrics");
        let _ = writeln!(out, "- **Total Records:** {}", summary.total_records);
        let _ = writeln!(
            out,
            "- **Period:** {} to {}",
            summary.date_range.start, summary.date_range.end
        );
        let _ = writeln!(
            out,
            "- **Total Metric Value:** {}",
            thousands(summary.total_metric_value)
        );
        match trend.average_growth_rate {
            Some(g) => {
                let _ = writeln!(out, "- **Average Monthly Growth:** {:.2}%", g * 100.0);
            }
            None => {
                let _ = writeln!(out, "- **Average Monthly Growth:** n/a");
            }
        }
        let _ = writeln!(
            out,
            "- **Trend Direction:** {}\n",
            capitalize(&trend.trend_direction.to_string())
        );

        let _ = writeln!(out, "## Top Performing Regions");
        let top_regions = performance.top_performers.regions.iter();
        for (region, value) in top_regions.take(PROMPT_TOP_REGIONS) {
            let _ = writeln!(out, "- {}: {}", region, thousands(*value));
        }

        let _ = writeln!(out, "\n## Anomalies Detected");
        let _ = writeln!(out, "{} anomalies requiring attention\n", self.anomaly_count());

        let _ = writeln!(out, "## Recommendations");
        for rec in self.recommendations.iter().take(SUMMARY_RECOMMENDATIONS) {
            let _ = writeln!(out, "- {}", rec);
        }

        out
    }
}

/// `1234567.891` -> `1,234,567.89`
fn thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommendationConfig;
    use crate::types::metric::row;

    fn rows() -> Vec<RawMetricRow> {
        vec![
            row("01-2025", "EMEA", "CSAT", 1000.0),
            row("01-2025", "APAC", "CSAT", 800.0),
            row("02-2025", "EMEA", "CSAT", 1500.0),
            row("02-2025", "APAC", "CSAT", 900.0),
        ]
    }

    #[tokio::test]
    async fn test_build_and_summarize() {
        let recommender = Recommender::offline(&RecommendationConfig::default());
        let report = ScorecardReport::build("scorecard.csv", &rows(), &recommender).await;

        assert_eq!(report.anomaly_count(), 0);
        let summary = report.executive_summary();
        assert!(summary.contains("**Total Records:** 4"));
        assert!(summary.contains("**Total Metric Value:** 4,200.00"));
        assert!(summary.contains("**Average Monthly Growth:** 33.33%"));
        assert!(summary.contains("**Trend Direction:** Increasing"));
        assert!(summary.contains("- EMEA: 2,500.00"));
        assert!(summary.contains("0 anomalies requiring attention"));
        assert!(summary.contains("- Monitor month-over-month growth rates"));
    }

    #[tokio::test]
    async fn test_empty_report() {
        let recommender = Recommender::offline(&RecommendationConfig::default());
        let report = ScorecardReport::build("empty.csv", &[], &recommender).await;

        assert!(report.data_summary.is_no_data());
        assert_eq!(report.recommendations, ["No data available for recommendations"]);
        assert!(report.executive_summary().contains("No data available."));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trend_analysis"]["status"], "no_data");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(1234567.891), "1,234,567.89");
        assert_eq!(thousands(12.0), "12.00");
        assert_eq!(thousands(-1000.0), "-1,000.00");
    }
}
