//! Scorecard metric rows
//!
//! One [`RawMetricRow`] is one aggregated observation returned by a metric
//! source. Column names follow the scorecard table, so rows deserialize
//! straight from CSV exports or JSON dumps of the query result.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One observation from the scorecard table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricRow {
    /// Reporting month, "MM-YYYY" or ISO "YYYY-MM[-DD]"
    #[serde(alias = "metric_report_mst_month", alias = "month")]
    pub period: Period,
    pub entry_type: String,
    pub business_unit: String,
    pub metric_name: String,
    pub region_name: String,
    /// Tri-state: the source column may be NULL
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub higher_is_better: Option<bool>,
    pub metric_value: f64,
}

/// Reporting period label with chronological ordering
///
/// Labels in "MM-YYYY" or "YYYY-MM[-DD]" form are stored as canonical
/// "MM-YYYY" and order by (year, month), so "1-2025", "01-2025" and
/// "2025-01-15" are the same period. Anything else is kept verbatim and
/// orders after all parseable labels, lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Period(String);

impl Period {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        match parse_year_month(&label) {
            Some((year, month)) => Self(format!("{:02}-{}", month, year)),
            None => Self(label),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// (year, month) when the label is in a known month format
    pub fn year_month(&self) -> Option<(i32, u32)> {
        parse_year_month(&self.0)
    }
}

fn parse_year_month(label: &str) -> Option<(i32, u32)> {
    let mut parts = label.trim().splitn(3, '-');
    let first = parts.next()?;
    let second = parts.next()?;

    let (year, month) = if first.len() == 4 {
        (first, second.get(..2).unwrap_or(second))
    } else if first.len() <= 2 && second.len() == 4 {
        (second, first)
    } else {
        return None;
    };

    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.year_month();
        let b = other.year_month();
        (a.is_none(), a, &self.0).cmp(&(b.is_none(), b, &other.0))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Period {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Period {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.0
    }
}

/// Accepts `true`/`false`, 1/0, the strings "true"/"false"/"1"/"0", and
/// empty/null as unknown.
fn deserialize_tri_state<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Bool(b)) => Ok(Some(b)),
        Some(Raw::Number(n)) if n == 1.0 => Ok(Some(true)),
        Some(Raw::Number(n)) if n == 0.0 => Ok(Some(false)),
        Some(Raw::Number(_)) => Ok(None),
        Some(Raw::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(Some(true)),
            "false" | "f" | "0" | "no" => Ok(Some(false)),
            _ => Ok(None),
        },
    }
}

#[cfg(test)]
pub(crate) fn row(period: &str, region: &str, metric: &str, value: f64) -> RawMetricRow {
    RawMetricRow {
        period: Period::new(period),
        entry_type: "actual".to_string(),
        business_unit: "CARE & SERVICES".to_string(),
        metric_name: metric.to_string(),
        region_name: region.to_string(),
        higher_is_better: Some(true),
        metric_value: value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_formats() {
        assert_eq!(Period::new("01-2025").year_month(), Some((2025, 1)));
        assert_eq!(Period::new("2025-03").year_month(), Some((2025, 3)));
        assert_eq!(Period::new("2025-03-01").year_month(), Some((2025, 3)));
        assert_eq!(Period::new("13-2025").year_month(), None);
        assert_eq!(Period::new("Q1 FY25").year_month(), None);
    }

    #[test]
    fn test_period_orders_chronologically_across_years() {
        let mut periods = vec![
            Period::new("02-2025"),
            Period::new("12-2024"),
            Period::new("01-2025"),
        ];
        periods.sort();
        let labels: Vec<_> = periods.iter().map(Period::as_str).collect();
        assert_eq!(labels, ["12-2024", "01-2025", "02-2025"]);
    }

    #[test]
    fn test_same_month_labels_collapse() {
        assert_eq!(Period::new("1-2025"), Period::new("01-2025"));
        assert_eq!(Period::new("2025-01-15").as_str(), "01-2025");
        assert_eq!(Period::new(" 2025-01 ").as_str(), "01-2025");
        assert_eq!(Period::new("Q1 FY25").as_str(), "Q1 FY25");

        let parsed: Vec<Period> = serde_json::from_str(r#"["1-2025", "2025-01"]"#).unwrap();
        assert_eq!(parsed[0], parsed[1]);
        assert_eq!(serde_json::to_value(&parsed[0]).unwrap(), "01-2025");
    }

    #[test]
    fn test_unparseable_periods_sort_last() {
        assert!(Period::new("Q1") > Period::new("12-2030"));
        assert!(Period::new("A") < Period::new("B"));
    }

    #[test]
    fn test_deserialize_scorecard_column_names() {
        let json = r#"{
            "metric_report_mst_month": "01-2025",
            "entry_type": "actual",
            "business_unit": "CARE & SERVICES",
            "metric_name": "CSAT",
            "region_name": "EMEA",
            "higher_is_better": "false",
            "metric_value": 87.5
        }"#;
        let row: RawMetricRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.period.as_str(), "01-2025");
        assert_eq!(row.higher_is_better, Some(false));
        assert_eq!(row.metric_value, 87.5);
    }

    #[test]
    fn test_higher_is_better_null() {
        let json = r#"{"period": "2025-01", "entry_type": "target", "business_unit": "B",
            "metric_name": "M", "region_name": "R", "higher_is_better": null, "metric_value": 1}"#;
        let row: RawMetricRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.higher_is_better, None);
    }
}
