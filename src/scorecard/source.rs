//! Scorecard metric sources
//!
//! - [`RedshiftSource`]: live query over the PostgreSQL wire protocol
//! - [`CsvSource`]: exported query result
//! - [`JsonSource`]: JSON array of rows

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::RedshiftConfig;
use crate::types::{DocError, Period, RawMetricRow, Result, ResultExt};

#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawMetricRow>>;

    /// Human-readable origin, recorded in reports
    fn describe(&self) -> String;
}

/// Pick a file source by extension
pub fn file_source(path: impl Into<PathBuf>) -> Result<Box<dyn MetricSource>> {
    let path = path.into();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(Box::new(CsvSource::new(path))),
        "json" => Ok(Box::new(JsonSource::new(path))),
        _ => Err(DocError::Source(format!(
            "{}: expected a .csv or .json export",
            path.display()
        ))),
    }
}

// =============================================================================
// Redshift
// =============================================================================

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RedshiftSource {
    options: PgConnectOptions,
    host: String,
    database: String,
    table: String,
    business_unit: String,
    window_start: String,
}

impl std::fmt::Debug for RedshiftSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedshiftSource")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl RedshiftSource {
    /// Fails with every missing connection setting named
    pub fn new(config: &RedshiftConfig) -> Result<Self> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(DocError::Config(format!(
                "Missing Redshift configuration: {}",
                missing.join(", ")
            )));
        }
        if !is_table_identifier(&config.table) {
            return Err(DocError::Config(format!(
                "Invalid scorecard table name: {}",
                config.table
            )));
        }

        let host = config.host.clone().unwrap_or_default();
        let database = config.database.clone().unwrap_or_default();
        let options = PgConnectOptions::new()
            .host(&host)
            .port(config.port)
            .database(&database)
            .username(config.user.as_deref().unwrap_or_default())
            .password(config.password.as_deref().unwrap_or_default())
            .ssl_mode(PgSslMode::Prefer);

        Ok(Self {
            options,
            host,
            database,
            table: config.table.clone(),
            business_unit: config.business_unit.clone(),
            window_start: config.window_start.clone(),
        })
    }

    /// Monthly scorecard rows grouped by every dimension
    pub fn query(&self) -> String {
        format!(
            "SELECT \
               TO_CHAR(metric_report_mst_month, 'MM-YYYY') AS metric_report_mst_month, \
               entry_type, \
               business_unit, \
               metric_name, \
               region_name, \
               CASE WHEN higher_is_better = 1 THEN 'true' \
                    WHEN higher_is_better = 0 THEN 'false' \
                    ELSE NULL END AS higher_is_better, \
               CAST(SUM(metric_value) AS DOUBLE PRECISION) AS metric_value \
             FROM {} \
             WHERE metric_report_mst_month >= CAST($1 AS DATE) \
               AND business_unit = $2 \
             GROUP BY metric_report_mst_month, entry_type, business_unit, \
                      metric_name, region_name, higher_is_better \
             ORDER BY metric_report_mst_month, business_unit",
            self.table
        )
    }

    async fn connect(&self) -> Result<PgPool> {
        Ok(PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_with(self.options.clone())
            .await?)
    }
}

#[async_trait]
impl MetricSource for RedshiftSource {
    async fn fetch(&self) -> Result<Vec<RawMetricRow>> {
        info!("Querying {} on {}/{}", self.table, self.host, self.database);
        let pool = self.connect().await?;

        let rows = sqlx::query(&self.query())
            .bind(&self.window_start)
            .bind(&self.business_unit)
            .fetch_all(&pool)
            .await?;
        pool.close().await;

        let rows = rows
            .iter()
            .map(|row| -> std::result::Result<RawMetricRow, sqlx::Error> {
                let flag: Option<String> = row.try_get("higher_is_better")?;
                Ok(RawMetricRow {
                    period: Period::new(row.try_get::<String, _>("metric_report_mst_month")?),
                    entry_type: row.try_get("entry_type")?,
                    business_unit: row.try_get("business_unit")?,
                    metric_name: row.try_get("metric_name")?,
                    region_name: row.try_get("region_name")?,
                    higher_is_better: flag.as_deref().map(|f| f == "true"),
                    metric_value: row.try_get::<Option<f64>, _>("metric_value")?.unwrap_or(0.0),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Fetched {} scorecard rows", rows.len());
        Ok(rows)
    }

    fn describe(&self) -> String {
        format!("redshift://{}/{} ({})", self.host, self.database, self.table)
    }
}

/// `schema.table` made of identifier characters only
fn is_table_identifier(name: &str) -> bool {
    name.split('.').all(|part| {
        !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

// =============================================================================
// File Sources
// =============================================================================

/// CSV export with the scorecard column names as header
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricSource for CsvSource {
    async fn fetch(&self) -> Result<Vec<RawMetricRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<RawMetricRow>, csv::Error>>()?;
        debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MetricSource for JsonSource {
    async fn fetch(&self) -> Result<Vec<RawMetricRow>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(format!("reading {}", self.path.display()))?;
        let rows: Vec<RawMetricRow> = serde_json::from_str(&content)?;
        debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_redshift_settings_listed() {
        let err = RedshiftSource::new(&RedshiftConfig::default()).unwrap_err();
        let message = err.to_string();
        for key in ["REDSHIFT_HOST", "REDSHIFT_DATABASE", "REDSHIFT_USER", "REDSHIFT_PASSWORD"] {
            assert!(message.contains(key), "{message} should name {key}");
        }
    }

    #[test]
    fn test_query_filters() {
        let config = RedshiftConfig {
            host: Some("cluster.example.com".to_string()),
            database: Some("analytics".to_string()),
            user: Some("reader".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let source = RedshiftSource::new(&config).unwrap();
        let query = source.query();

        assert!(query.contains("FROM ba_corporate.scorecard_test_dn"));
        assert!(query.contains("TO_CHAR(metric_report_mst_month, 'MM-YYYY')"));
        assert!(query.contains("business_unit = $2"));
        assert_eq!(
            source.describe(),
            "redshift://cluster.example.com/analytics (ba_corporate.scorecard_test_dn)"
        );
        assert!(!format!("{:?}", source).contains("secret"));
    }

    #[test]
    fn test_table_name_rejected() {
        let config = RedshiftConfig {
            host: Some("h".to_string()),
            database: Some("d".to_string()),
            user: Some("u".to_string()),
            password: Some("p".to_string()),
            table: "t; DROP TABLE x".to_string(),
            ..Default::default()
        };
        assert!(matches!(RedshiftSource::new(&config), Err(DocError::Config(_))));
    }

    #[tokio::test]
    async fn test_csv_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scorecard.csv");
        std::fs::write(
            &path,
            "metric_report_mst_month,entry_type,business_unit,metric_name,region_name,higher_is_better,metric_value\n\
             01-2025,actual,CARE & SERVICES,CSAT,EMEA,true,87.5\n\
             02-2025,target,CARE & SERVICES,AHT,APAC,,420\n\
             02-2025,actual,CARE & SERVICES,AHT,APAC,0,410\n",
        )
        .unwrap();

        let rows = file_source(&path).unwrap().fetch().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].period.as_str(), "01-2025");
        assert_eq!(rows[0].higher_is_better, Some(true));
        assert_eq!(rows[1].higher_is_better, None);
        assert_eq!(rows[2].higher_is_better, Some(false));
        assert_eq!(rows[1].metric_value, 420.0);
    }

    #[tokio::test]
    async fn test_json_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(
            &path,
            r#"[{"month": "2025-01", "entry_type": "actual", "business_unit": "B",
                "metric_name": "M", "region_name": "R", "metric_value": 3.5}]"#,
        )
        .unwrap();

        let source = JsonSource::new(&path);
        let rows = source.fetch().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].higher_is_better, None);
        assert!(source.describe().ends_with("rows.json"));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(file_source("rows.parquet"), Err(DocError::Source(_))));
    }
}
