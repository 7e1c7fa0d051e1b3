//! Scrape side of the exporter.
//!
//! `PrometheusHandler` feeds measures into a `MetricStore` and renders it in
//! the Prometheus text format; `retention` runs the periodic cleanup task.

pub mod exposition;
pub mod handler;
pub mod retention;

pub use handler::{BucketKey, PrometheusHandler};
