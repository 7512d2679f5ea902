//! Scorecard statistics
//!
//! Pure views over a table of [`RawMetricRow`]s. Every function returns
//! [`Analysis::NoData`] for an empty table instead of failing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::constants::analytics::{IQR_MULTIPLIER, TOP_N};
use crate::types::{Period, RawMetricRow};

const NO_DATA_MESSAGE: &str = "No data available";

/// Result of an analytics view, or the empty-table sentinel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Analysis<T> {
    NoData(NoData),
    Ready(T),
}

/// Serialized as `{"status": "no_data", "message": "No data available"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoData {
    pub status: NoDataStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataStatus {
    NoData,
}

impl<T> Analysis<T> {
    pub fn no_data() -> Self {
        Self::NoData(NoData {
            status: NoDataStatus::NoData,
            message: NO_DATA_MESSAGE.to_string(),
        })
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NoData(_) => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Period,
    pub end: Period,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_records: usize,
    pub date_range: DateRange,
    pub business_units: Vec<String>,
    pub regions: Vec<String>,
    pub metrics: Vec<String>,
    pub total_metric_value: f64,
    pub average_metric_value: f64,
    /// Sample standard deviation; absent for a single row
    pub metric_value_std: Option<f64>,
}

impl AggregateSummary {
    pub fn unique_business_units(&self) -> usize {
        self.business_units.len()
    }

    pub fn unique_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn unique_metrics(&self) -> usize {
        self.metrics.len()
    }
}

pub fn summarize(rows: &[RawMetricRow]) -> Analysis<AggregateSummary> {
    let (Some(start), Some(end)) = (
        rows.iter().map(|r| &r.period).min(),
        rows.iter().map(|r| &r.period).max(),
    ) else {
        return Analysis::no_data();
    };

    let values: Vec<f64> = rows.iter().map(|r| r.metric_value).collect();
    let total: f64 = values.iter().sum();

    Analysis::Ready(AggregateSummary {
        total_records: rows.len(),
        date_range: DateRange {
            start: start.clone(),
            end: end.clone(),
        },
        business_units: distinct(rows.iter().map(|r| r.business_unit.as_str())),
        regions: distinct(rows.iter().map(|r| r.region_name.as_str())),
        metrics: distinct(rows.iter().map(|r| r.metric_name.as_str())),
        total_metric_value: total,
        average_metric_value: total / rows.len() as f64,
        metric_value_std: sample_std(&values),
    })
}

// =============================================================================
// Trend
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Summed metric value per period, chronological
    pub monthly_totals: BTreeMap<Period, f64>,
    /// Period-over-period change, one entry per period after the first;
    /// absent with fewer than two periods. An entry is `None` (`null` in
    /// JSON) when the preceding total is zero.
    pub growth_rates: Option<BTreeMap<Period, Option<f64>>>,
    pub average_growth_rate: Option<f64>,
    pub trend_direction: TrendDirection,
    /// Sample standard deviation of the growth rates
    pub volatility: Option<f64>,
    pub best_month: Period,
    pub worst_month: Period,
}

pub fn trend(rows: &[RawMetricRow]) -> Analysis<TrendReport> {
    let mut totals: BTreeMap<Period, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.period.clone()).or_default() += row.metric_value;
    }

    // First max/min in chronological order wins ties
    let mut best: Option<(&Period, f64)> = None;
    let mut worst: Option<(&Period, f64)> = None;
    for (period, &total) in &totals {
        if best.is_none_or(|(_, b)| total > b) {
            best = Some((period, total));
        }
        if worst.is_none_or(|(_, w)| total < w) {
            worst = Some((period, total));
        }
    }
    let (Some((best_month, _)), Some((worst_month, _))) = (best, worst) else {
        return Analysis::no_data();
    };
    let (best_month, worst_month) = (best_month.clone(), worst_month.clone());

    let growth_rates = (totals.len() >= 2).then(|| {
        totals
            .iter()
            .zip(totals.iter().skip(1))
            .map(|((_, prev), (period, cur))| (period.clone(), growth(*prev, *cur)))
            .collect::<BTreeMap<_, _>>()
    });

    // Undefined rates stay out of the mean and volatility
    let rates: Vec<f64> = growth_rates
        .as_ref()
        .map(|g| g.values().flatten().copied().collect())
        .unwrap_or_default();
    let average_growth_rate = mean(&rates);
    let trend_direction = match average_growth_rate {
        Some(avg) if avg > 0.0 => TrendDirection::Increasing,
        _ => TrendDirection::Decreasing,
    };

    Analysis::Ready(TrendReport {
        monthly_totals: totals,
        growth_rates,
        average_growth_rate,
        trend_direction,
        volatility: sample_std(&rates),
        best_month,
        worst_month,
    })
}

// =============================================================================
// Performance
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub sum: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformers {
    /// (region, summed value), descending
    pub regions: Vec<(String, f64)>,
    pub metrics: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub by_region: BTreeMap<String, GroupStats>,
    pub by_metric: BTreeMap<String, GroupStats>,
    pub by_entry_type: BTreeMap<String, GroupStats>,
    pub top_performers: TopPerformers,
}

pub fn performance(rows: &[RawMetricRow]) -> Analysis<PerformanceReport> {
    if rows.is_empty() {
        return Analysis::no_data();
    }

    let by_region = group_stats(rows, |r| &r.region_name);
    let by_metric = group_stats(rows, |r| &r.metric_name);
    let by_entry_type = group_stats(rows, |r| &r.entry_type);

    let top_performers = TopPerformers {
        regions: top_by_sum(&by_region),
        metrics: top_by_sum(&by_metric),
    };

    Analysis::Ready(PerformanceReport {
        by_region,
        by_metric,
        by_entry_type,
        top_performers,
    })
}

fn group_stats<F>(rows: &[RawMetricRow], key: F) -> BTreeMap<String, GroupStats>
where
    F: Fn(&RawMetricRow) -> &String,
{
    let mut sums: HashMap<&String, (f64, usize)> = HashMap::new();
    for row in rows {
        let entry = sums.entry(key(row)).or_default();
        entry.0 += row.metric_value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(name, (sum, count))| {
            (
                name.clone(),
                GroupStats {
                    sum,
                    mean: sum / count as f64,
                    count,
                },
            )
        })
        .collect()
}

fn top_by_sum(groups: &BTreeMap<String, GroupStats>) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = groups.iter().map(|(k, s)| (k.clone(), s.sum)).collect();
    // Stable sort keeps name order among equal sums
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(TOP_N);
    ranked
}

// =============================================================================
// Anomalies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Outlier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub metric_name: String,
    pub region_name: String,
    pub metric_value: f64,
    pub month: Period,
    pub severity: Severity,
}

/// IQR fences over the whole table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        })
    }
}

/// Rows outside the IQR fences, in table order
///
/// Severity is `high` only above the upper fence; everything else flagged,
/// including values far below the lower fence, is `low`.
pub fn detect_anomalies(rows: &[RawMetricRow]) -> Analysis<Vec<Anomaly>> {
    let values: Vec<f64> = rows.iter().map(|r| r.metric_value).collect();
    let Some(fences) = Fences::from_values(&values) else {
        return Analysis::no_data();
    };

    let anomalies = rows
        .iter()
        .filter(|r| r.metric_value < fences.lower || r.metric_value > fences.upper)
        .map(|r| Anomaly {
            kind: AnomalyKind::Outlier,
            metric_name: r.metric_name.clone(),
            region_name: r.region_name.clone(),
            metric_value: r.metric_value,
            month: r.period.clone(),
            severity: if r.metric_value > fences.upper {
                Severity::High
            } else {
                Severity::Low
            },
        })
        .collect();

    Analysis::Ready(anomalies)
}

// =============================================================================
// Helpers
// =============================================================================

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn growth(prev: f64, cur: f64) -> Option<f64> {
    (prev != 0.0).then(|| (cur - prev) / prev)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); `None` below two values
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Linear-interpolation quantile over sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = last as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}
