//! Shared application state for the exporter.
//!
//! Owns the metric store, the Prometheus handler that fills it and the engine
//! instrumented code reports through. Everything is built explicitly from the
//! config; nothing here is process-global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use promstats_core::engine::Handler;
use promstats_core::{Engine, MetricStore};

use crate::config::ExporterConfig;
use crate::obs::PrometheusHandler;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    prometheus: Arc<PrometheusHandler>,
    engine: Arc<Engine>,
    draining: AtomicBool,
}

impl AppState {
    pub fn new(cfg: ExporterConfig) -> Self {
        let store = Arc::new(MetricStore::new());
        let prometheus = Arc::new(PrometheusHandler::from_config(store, &cfg));
        let engine = Arc::new(Engine::new(
            cfg.exporter.prefix.clone(),
            vec![Arc::clone(&prometheus) as Arc<dyn Handler>],
        ));

        tracing::info!(
            histograms = cfg.histograms.len(),
            metric_timeout_ms = cfg.exporter.metric_timeout_ms,
            "exporter state ready"
        );

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                prometheus,
                engine,
                draining: AtomicBool::new(false),
            }),
        }
    }

    pub fn prometheus(&self) -> Arc<PrometheusHandler> {
        Arc::clone(&self.inner.prometheus)
    }

    /// Engine instrumented code (e.g. `httpstats::TransportLayer`) reports to.
    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.inner.engine)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.inner.cfg.exporter.cleanup_interval_ms)
    }

    /// Mark draining state.
    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    /// Return whether draining is active.
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }
}
