//! Prometheus handler: turns measures into store samples and renders scrapes.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use promstats_core::engine::Handler;
use promstats_core::{Measure, MetricStore, MetricType, Sample};

use super::exposition;
use crate::config::ExporterConfig;

/// (measure name, field name) key for histogram boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub measure: String,
    pub field: String,
}

impl BucketKey {
    pub fn new(measure: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            measure: measure.into(),
            field: field.into(),
        }
    }
}

pub struct PrometheusHandler {
    store: Arc<MetricStore>,
    metric_timeout: Duration,
    default_buckets: Arc<[f64]>,
    buckets: DashMap<BucketKey, Arc<[f64]>>,
}

impl PrometheusHandler {
    pub fn new(store: Arc<MetricStore>, metric_timeout: Duration, default_buckets: Vec<f64>) -> Self {
        Self {
            store,
            metric_timeout,
            default_buckets: default_buckets.into(),
            buckets: DashMap::new(),
        }
    }

    /// Build from a validated config.
    pub fn from_config(store: Arc<MetricStore>, cfg: &ExporterConfig) -> Self {
        let handler = Self::new(
            store,
            Duration::from_millis(cfg.exporter.metric_timeout_ms),
            cfg.default_buckets.clone(),
        );
        for h in &cfg.histograms {
            handler.set_buckets(BucketKey::new(h.measure.as_str(), h.field.as_str()), h.buckets.clone());
        }
        handler
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// Boundaries for series created after this call; existing histogram
    /// entries keep the boundaries they were created with.
    pub fn set_buckets(&self, key: BucketKey, boundaries: Vec<f64>) {
        self.buckets.insert(key, boundaries.into());
    }

    fn buckets_for(&self, measure: &str, field: &str) -> Arc<[f64]> {
        self.buckets
            .get(&BucketKey::new(measure, field))
            .map(|b| Arc::clone(b.value()))
            .unwrap_or_else(|| Arc::clone(&self.default_buckets))
    }

    /// Drop states older than `now - metric_timeout`. Returns evicted series.
    pub fn cleanup(&self, now: SystemTime) -> usize {
        match now.checked_sub(self.metric_timeout) {
            Some(horizon) => self.store.cleanup(horizon),
            None => 0,
        }
    }

    /// Expire, collect and format the store as of `now`.
    pub fn render(&self, now: SystemTime) -> String {
        self.cleanup(now);
        exposition::render(&self.store.collect())
    }
}

impl Handler for PrometheusHandler {
    fn handle_measures(&self, time: SystemTime, measures: &[Measure]) {
        for m in measures {
            let labels = m.labels();
            for f in &m.fields {
                let mtype = MetricType::from(f.kind);
                let sample = Sample::new(mtype, m.name.as_str(), f.name.as_str(), f.value)
                    .with_labels(labels.clone())
                    .at(time);
                match mtype {
                    MetricType::Histogram => {
                        let boundaries = self.buckets_for(&m.name, &f.name);
                        self.store.update(&sample, &boundaries);
                    }
                    MetricType::Counter | MetricType::Gauge => self.store.update(&sample, &[]),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promstats_core::{Engine, Field};

    fn handler() -> Arc<PrometheusHandler> {
        Arc::new(PrometheusHandler::new(
            Arc::new(MetricStore::new()),
            Duration::from_secs(60),
            vec![1.0, f64::INFINITY],
        ))
    }

    #[test]
    fn measures_become_series() {
        let h = handler();
        let engine = Engine::new("", vec![h.clone() as Arc<dyn Handler>]);

        for _ in 0..2 {
            engine.report(
                Measure::new("http")
                    .field(Field::counter("req.count", 1.0))
                    .field(Field::histogram("rtt.seconds", 0.5))
                    .tag("bucket", "2xx"),
            );
        }

        let text = h.render(SystemTime::now());
        assert!(text.contains("# TYPE http_req_count counter\n"), "{text}");
        assert!(text.contains("http_req_count{bucket=\"2xx\"} 2\n"), "{text}");
        assert!(text.contains("http_rtt_seconds_bucket{bucket=\"2xx\",le=\"1\"} 2\n"), "{text}");
        assert!(text.contains("http_rtt_seconds_count{bucket=\"2xx\"} 2\n"), "{text}");
    }

    #[test]
    fn per_field_buckets_override_defaults() {
        let h = handler();
        h.set_buckets(BucketKey::new("db", "latency"), vec![0.1, 0.2]);
        h.handle_measures(
            SystemTime::now(),
            &[Measure::new("db").field(Field::histogram("latency", 0.15))],
        );

        let entry_bounds: Vec<Vec<String>> = h
            .store()
            .collect()
            .iter()
            .filter(|m| m.name == "latency_bucket")
            .map(|m| m.labels.iter().map(|l| l.value.clone()).collect())
            .collect();
        assert_eq!(entry_bounds.len(), 2);
        assert!(entry_bounds.iter().any(|l| l == &vec!["0.2".to_string()]));
    }

    #[test]
    fn render_expires_stale_series() {
        let h = handler();
        let old = SystemTime::now() - Duration::from_secs(3600);
        h.handle_measures(old, &[Measure::new("job").field(Field::gauge("queue", 3.0))]);
        h.handle_measures(SystemTime::now(), &[Measure::new("job").field(Field::gauge("workers", 4.0))]);

        let text = h.render(SystemTime::now());
        assert!(!text.contains("job_queue"), "{text}");
        assert!(text.contains("job_workers 4\n"), "{text}");
        assert_eq!(h.store().len(), 1);
    }
}
