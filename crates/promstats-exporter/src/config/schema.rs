use serde::Deserialize;
use promstats_core::buckets;
use promstats_core::error::{PromStatsError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    /// Boundaries for histogram fields without a dedicated entry below.
    #[serde(default = "default_buckets")]
    pub default_buckets: Vec<f64>,

    #[serde(default)]
    pub histograms: Vec<HistogramConfig>,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromStatsError::UnsupportedVersion(self.version));
        }

        self.exporter.validate()?;

        if !buckets::is_valid(&self.default_buckets) {
            return Err(PromStatsError::BadRequest(
                "default_buckets must be non-empty and strictly ascending".into(),
            ));
        }
        for h in &self.histograms {
            h.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// States older than this are dropped at scrape/cleanup time.
    #[serde(default = "default_metric_timeout_ms")]
    pub metric_timeout_ms: u64,

    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// Prefix prepended to every measure reported by the exporter itself.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metric_timeout_ms: default_metric_timeout_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            prefix: default_prefix(),
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(PromStatsError::BadRequest(format!(
                "exporter.listen must be a socket address, got {:?}",
                self.listen
            )));
        }
        if !(1000..=86_400_000).contains(&self.metric_timeout_ms) {
            return Err(PromStatsError::BadRequest(
                "exporter.metric_timeout_ms must be between 1000 and 86400000".into(),
            ));
        }
        if !(100..=3_600_000).contains(&self.cleanup_interval_ms) {
            return Err(PromStatsError::BadRequest(
                "exporter.cleanup_interval_ms must be between 100 and 3600000".into(),
            ));
        }
        if self.cleanup_interval_ms > self.metric_timeout_ms {
            return Err(PromStatsError::BadRequest(
                "exporter.cleanup_interval_ms must not exceed metric_timeout_ms".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9090".into()
}
fn default_metric_timeout_ms() -> u64 {
    120_000
}
fn default_cleanup_interval_ms() -> u64 {
    10_000
}
fn default_prefix() -> String {
    "promstats".into()
}

/// Prometheus client defaults, closed with +Inf.
pub fn default_buckets() -> Vec<f64> {
    vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, f64::INFINITY]
}

/// Boundaries for one (measure, field) pair.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramConfig {
    pub measure: String,
    pub field: String,
    pub buckets: Vec<f64>,
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<()> {
        if self.measure.is_empty() || self.field.is_empty() {
            return Err(PromStatsError::BadRequest(
                "histograms[].measure and histograms[].field must not be empty".into(),
            ));
        }
        if !buckets::is_valid(&self.buckets) {
            return Err(PromStatsError::BadRequest(format!(
                "histogram {}.{} buckets must be non-empty and strictly ascending",
                self.measure, self.field
            )));
        }
        Ok(())
    }
}
