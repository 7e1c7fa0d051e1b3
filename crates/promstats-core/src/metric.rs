//! Samples (input) and aggregated metrics (output) of the store.

use std::cmp::Ordering;
use std::time::SystemTime;

use crate::labels::LabelSet;

/// Aggregation semantics of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    /// Name used on `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
        }
    }
}

/// One observation pushed into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub mtype: MetricType,
    pub scope: String,
    pub name: String,
    pub labels: LabelSet,
    pub value: f64,
    pub time: SystemTime,
}

impl Sample {
    pub fn new(mtype: MetricType, scope: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self {
            mtype,
            scope: scope.into(),
            name: name.into(),
            labels: LabelSet::new(),
            value,
            time: SystemTime::now(),
        }
    }

    pub fn counter(scope: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self::new(MetricType::Counter, scope, name, value)
    }

    pub fn gauge(scope: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self::new(MetricType::Gauge, scope, name, value)
    }

    pub fn histogram(scope: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self::new(MetricType::Histogram, scope, name, value)
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn at(mut self, time: SystemTime) -> Self {
        self.time = time;
        self
    }
}

/// An aggregated record produced by `collect`.
///
/// Histogram series expand into `<name>_bucket`, `<name>_count` and
/// `<name>_sum` records, all typed `Histogram`.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub mtype: MetricType,
    pub scope: String,
    pub name: String,
    pub labels: LabelSet,
    pub value: f64,
    pub time: SystemTime,
}

impl Metric {
    pub fn cmp_by_name_and_labels(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.labels.cmp(&other.labels))
    }
}

/// Sort collected metrics by scope, name, then labels.
pub fn sort_by_name_and_labels(metrics: &mut [Metric]) {
    metrics.sort_by(Metric::cmp_by_name_and_labels);
}
