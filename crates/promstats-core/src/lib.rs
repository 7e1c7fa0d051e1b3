//! promstats core: label sets, samples, the concurrent metric store and the
//! measure engine that feeds it.
//!
//! This crate carries no transport or runtime dependencies so it can be
//! embedded directly in instrumented code. The exporter crate adds the
//! Prometheus handler, HTTP instrumentation and the scrape endpoint.
//!
//! Panics, `unwrap` and `expect` are denied in non-test code; the store has
//! no failure modes and everything else surfaces as `PromStatsError`.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod buckets;
pub mod engine;
pub mod error;
pub mod labels;
pub mod measure;
pub mod metric;
pub mod store;
pub mod testing;

pub use engine::{Engine, Handler};
pub use error::{ErrorCode, PromStatsError, Result};
pub use labels::{Label, LabelSet};
pub use measure::{Field, FieldKind, Measure, Tag};
pub use metric::{sort_by_name_and_labels, Metric, MetricType, Sample};
pub use store::{MetricEntry, MetricKey, MetricStore};
