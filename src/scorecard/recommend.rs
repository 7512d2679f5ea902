//! Scorecard recommendations
//!
//! Narrative recommendations from an LLM when one is configured, otherwise
//! (or whenever the call fails) a fixed rule set over the statistics.

use tracing::{debug, warn};

use super::stats::{
    AggregateSummary, PerformanceReport, TrendDirection, TrendReport, performance, summarize,
    trend,
};
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::{LlmRequest, SharedProvider};
use crate::config::RecommendationConfig;
use crate::constants::analytics::{
    PROMPT_TOP_REGIONS, UNDERPERFORM_RATIO, UNDERPERFORMERS_NAMED, VOLATILITY_THRESHOLD,
};
use crate::types::RawMetricRow;

const NO_DATA: &str = "No data available for recommendations";

pub struct Recommender {
    provider: Option<SharedProvider>,
    max_tokens: usize,
    temperature: f32,
}

impl Recommender {
    pub fn new(provider: Option<SharedProvider>, config: &RecommendationConfig) -> Self {
        Self {
            provider,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Rule-based only
    pub fn offline(config: &RecommendationConfig) -> Self {
        Self::new(None, config)
    }

    pub fn uses_llm(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn recommend(&self, rows: &[RawMetricRow]) -> Vec<String> {
        let (Some(summary), Some(trend), Some(performance)) = (
            summarize(rows).ready().cloned(),
            trend(rows).ready().cloned(),
            performance(rows).ready().cloned(),
        ) else {
            return vec![NO_DATA.to_string()];
        };

        let Some(provider) = &self.provider else {
            return fallback(&trend, &performance);
        };

        let prompt = PromptTemplates::recommendations(&prompt_facts(&summary, &trend, &performance));
        let request = LlmRequest::text(prompt, self.max_tokens, self.temperature);

        match provider.generate(&request).await {
            Ok(response) => {
                let lines = parse_bullets(&response.content);
                if lines.is_empty() {
                    warn!("Recommendation model returned nothing; using rule-based list");
                    return fallback(&trend, &performance);
                }
                debug!("{} recommendation(s) from {}", lines.len(), provider.name());
                lines
            }
            Err(e) => {
                warn!("Recommendation request failed ({}); using rule-based list", e);
                fallback(&trend, &performance)
            }
        }
    }
}

/// Deterministic recommendations from threshold rules
pub fn fallback(trend: &TrendReport, performance: &PerformanceReport) -> Vec<String> {
    let mut recommendations = Vec::new();

    if trend.trend_direction == TrendDirection::Decreasing {
        recommendations
            .push("Investigate declining trend and implement corrective measures".to_string());
    }

    if trend.volatility.is_some_and(|v| v > VOLATILITY_THRESHOLD) {
        recommendations
            .push("High volatility detected - consider stabilization strategies".to_string());
    }

    let regions = &performance.by_region;
    if !regions.is_empty() {
        let average = regions.values().map(|s| s.sum).sum::<f64>() / regions.len() as f64;
        let underperformers: Vec<&str> = regions
            .iter()
            .filter(|(_, s)| s.sum < average * UNDERPERFORM_RATIO)
            .map(|(name, _)| name.as_str())
            .take(UNDERPERFORMERS_NAMED)
            .collect();
        if !underperformers.is_empty() {
            recommendations.push(format!(
                "Focus improvement efforts on underperforming regions: {}",
                underperformers.join(", ")
            ));
        }
    }

    recommendations
        .push("Monitor month-over-month growth rates to maintain positive trajectory".to_string());
    recommendations.push("Review top-performing regions to identify best practices".to_string());
    recommendations
}

fn prompt_facts(
    summary: &AggregateSummary,
    trend: &TrendReport,
    performance: &PerformanceReport,
) -> Vec<(&'static str, String)> {
    let growth = trend
        .average_growth_rate
        .map(|g| format!("{:.2}%", g * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    let top_regions: Vec<&str> = performance
        .top_performers
        .regions
        .iter()
        .take(PROMPT_TOP_REGIONS)
        .map(|(name, _)| name.as_str())
        .collect();

    vec![
        ("Total Records", summary.total_records.to_string()),
        (
            "Date Range",
            format!("{} to {}", summary.date_range.start, summary.date_range.end),
        ),
        ("Business Units", summary.business_units.join(", ")),
        ("Regions", summary.regions.join(", ")),
        ("Total Metric Value", format!("{:.2}", summary.total_metric_value)),
        ("Average Growth Rate", growth),
        ("Trend Direction", trend.trend_direction.to_string()),
        ("Top Performing Regions", top_regions.join(", ")),
    ]
}

/// One recommendation per non-empty line, leading bullets removed
fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim_start_matches(|c: char| matches!(c, '•' | '-' | '*') || c.is_whitespace())
                .trim_end()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::tests::ScriptedProvider;
    use crate::types::DocError;
    use crate::types::metric::row;

    fn declining_rows() -> Vec<RawMetricRow> {
        vec![
            row("01-2025", "EMEA", "CSAT", 100.0),
            row("01-2025", "APAC", "CSAT", 100.0),
            row("01-2025", "LATAM", "CSAT", 10.0),
            row("02-2025", "EMEA", "CSAT", 50.0),
        ]
    }

    #[tokio::test]
    async fn test_empty_table() {
        let recommender = Recommender::offline(&RecommendationConfig::default());
        assert_eq!(recommender.recommend(&[]).await, [NO_DATA]);
    }

    #[tokio::test]
    async fn test_fallback_rules() {
        let recommender = Recommender::offline(&RecommendationConfig::default());
        let recs = recommender.recommend(&declining_rows()).await;

        assert_eq!(
            recs[0],
            "Investigate declining trend and implement corrective measures"
        );
        // region sums EMEA 150, APAC 100, LATAM 10; 0.7 * mean = 60.67
        assert!(recs.contains(
            &"Focus improvement efforts on underperforming regions: LATAM".to_string()
        ));
        assert_eq!(
            recs.last().unwrap(),
            "Review top-performing regions to identify best practices"
        );
        // single growth rate, so no volatility figure
        assert!(!recs.iter().any(|r| r.contains("volatility")));
    }

    #[tokio::test]
    async fn test_volatility_flagged() {
        let rows = vec![
            row("01-2025", "EMEA", "CSAT", 100.0),
            row("02-2025", "EMEA", "CSAT", 200.0),
            row("03-2025", "EMEA", "CSAT", 100.0),
            row("04-2025", "EMEA", "CSAT", 250.0),
        ];
        let recs = Recommender::offline(&RecommendationConfig::default())
            .recommend(&rows)
            .await;
        assert!(recs.iter().any(|r| r.starts_with("High volatility detected")));
        assert!(!recs.iter().any(|r| r.starts_with("Investigate declining")));
    }

    #[tokio::test]
    async fn test_llm_bullets_parsed() {
        let provider = ScriptedProvider::new(vec![Ok(
            "• Expand EMEA staffing\n\n- Review LATAM targets\n  * Automate reporting  \n".to_string(),
        )]);
        let recommender =
            Recommender::new(Some(provider.clone()), &RecommendationConfig::default());

        let recs = recommender.recommend(&declining_rows()).await;
        assert_eq!(
            recs,
            ["Expand EMEA staffing", "Review LATAM targets", "Automate reporting"]
        );

        let requests = provider.requests.lock().unwrap();
        assert!(requests[0].prompt.contains("Trend Direction"));
        assert!(requests[0].prompt.contains("decreasing"));
        assert!(requests[0].prompt.contains("-76.19%"));
        assert_eq!(requests[0].max_tokens, 500);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back() {
        let provider = ScriptedProvider::new(vec![Err(DocError::LlmApi("429".to_string()))]);
        let recommender =
            Recommender::new(Some(provider.clone()), &RecommendationConfig::default());

        let recs = recommender.recommend(&declining_rows()).await;
        assert_eq!(provider.calls(), 1);
        assert_eq!(
            recs,
            fallback(
                trend(&declining_rows()).ready().unwrap(),
                performance(&declining_rows()).ready().unwrap()
            )
        );
    }

    #[tokio::test]
    async fn test_blank_reply_falls_back() {
        let provider = ScriptedProvider::new(vec![Ok("  \n • \n".to_string())]);
        let recs = Recommender::new(Some(provider), &RecommendationConfig::default())
            .recommend(&declining_rows())
            .await;
        assert!(recs.iter().any(|r| r.starts_with("Monitor month-over-month")));
    }
}
