//! Scorecard Analytics
//!
//! Data-direct path used when no screenshots are available: metric rows
//! from a [`MetricSource`] are summarized, trended, broken down by
//! dimension and screened for outliers, then turned into recommendations.

pub mod recommend;
pub mod report;
pub mod source;
pub mod stats;

pub use recommend::{Recommender, fallback};
pub use report::ScorecardReport;
pub use source::{CsvSource, JsonSource, MetricSource, RedshiftSource, file_source};
pub use stats::{
    AggregateSummary, Analysis, Anomaly, GroupStats, PerformanceReport, Severity, TrendDirection,
    TrendReport, detect_anomalies, performance, summarize, trend,
};

/// Report file name prefix
pub const REPORT_PREFIX: &str = "scorecard_analysis";
