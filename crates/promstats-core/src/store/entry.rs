use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::buckets::{cumulative_counts, format_boundary};
use crate::labels::LabelSet;
use crate::metric::{Metric, MetricType, Sample};

/// Label attached to cumulative histogram buckets.
pub const BUCKET_LABEL: &str = "le";

/// One retained observation (or running total, for counters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricState {
    pub value: f64,
    pub time: SystemTime,
}

/// All partitions of one (scope, name) series.
///
/// Every list stored under `states` is non-empty; a partition whose last state
/// expires is removed in the same critical section.
#[derive(Debug)]
pub struct MetricEntry {
    mtype: MetricType,
    scope: String,
    name: String,
    boundaries: Vec<f64>,
    states: Mutex<HashMap<LabelSet, Vec<MetricState>>>,
}

impl MetricEntry {
    /// `boundaries` is kept only for histograms and is fixed for the lifetime
    /// of the entry.
    pub fn new(mtype: MetricType, scope: impl Into<String>, name: impl Into<String>, boundaries: &[f64]) -> Self {
        let boundaries = match mtype {
            MetricType::Histogram => boundaries.to_vec(),
            MetricType::Counter | MetricType::Gauge => Vec::new(),
        };
        Self {
            mtype,
            scope: scope.into(),
            name: name.into(),
            boundaries,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }

    /// Number of live partitions.
    pub fn partitions(&self) -> usize {
        self.states.lock().len()
    }

    /// Fold a sample into its partition using this entry's semantics.
    pub fn update(&self, sample: &Sample) {
        let state = MetricState {
            value: sample.value,
            time: sample.time,
        };

        let mut states = self.states.lock();
        let list = states.entry(sample.labels.clone()).or_default();

        match (self.mtype, list.first_mut()) {
            (MetricType::Counter, Some(s)) => {
                s.value += state.value;
                // latest applied sample wins, even when it carries an older time
                s.time = state.time;
            }
            (MetricType::Gauge, Some(s)) => *s = state,
            (MetricType::Counter | MetricType::Gauge | MetricType::Histogram, _) => list.push(state),
        }
    }

    /// Aggregated view of every partition, appended to `out`.
    pub fn collect_into(&self, out: &mut Vec<Metric>) {
        let states = self.states.lock();
        for (labels, list) in states.iter() {
            match self.mtype {
                MetricType::Counter | MetricType::Gauge => {
                    if let Some(s) = list.first() {
                        out.push(self.metric(self.name.clone(), labels.clone(), s.value, s.time));
                    }
                }
                MetricType::Histogram => self.collect_histogram(labels, list, out),
            }
        }
    }

    pub fn collect(&self) -> Vec<Metric> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_histogram(&self, labels: &LabelSet, list: &[MetricState], out: &mut Vec<Metric>) {
        let Some(time) = list.iter().map(|s| s.time).max() else {
            return;
        };
        let counts = cumulative_counts(&self.boundaries, list.iter().map(|s| s.value));
        let sum: f64 = list.iter().map(|s| s.value).sum();

        let bucket_name = format!("{}_bucket", self.name);
        for (b, count) in self.boundaries.iter().zip(counts) {
            let labels = labels.with(BUCKET_LABEL, format_boundary(*b));
            out.push(self.metric(bucket_name.clone(), labels, count as f64, time));
        }
        out.push(self.metric(format!("{}_count", self.name), labels.clone(), list.len() as f64, time));
        out.push(self.metric(format!("{}_sum", self.name), labels.clone(), sum, time));
    }

    fn metric(&self, name: String, labels: LabelSet, value: f64, time: SystemTime) -> Metric {
        Metric {
            mtype: self.mtype,
            scope: self.scope.clone(),
            name,
            labels,
            value,
            time,
        }
    }

    /// Drop every state with `time <= horizon` and every partition left empty.
    ///
    /// Returns true when this call evicted the last remaining states, so the
    /// owner should try to unlink the entry. Only this entry's lock is taken.
    pub fn cleanup(&self, horizon: SystemTime) -> bool {
        let mut states = self.states.lock();
        if states.is_empty() {
            return false;
        }
        states.retain(|_, list| {
            list.retain(|s| s.time > horizon);
            !list.is_empty()
        });
        states.is_empty()
    }
}
