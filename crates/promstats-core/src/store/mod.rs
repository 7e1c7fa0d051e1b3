//! Concurrent metric store.
//!
//! Two lock levels: the store's `RwLock` over the entry map, and one `Mutex`
//! per entry over its partitions. Locks are only ever taken in that order
//! (store, then entry) and never more than one entry at a time.
//!
//! Cleanup runs in two phases:
//! 1. under the store read lock, every entry purges itself and reports whether
//!    it became empty (the entry lock is released before the report is read);
//! 2. if anything emptied, the store write lock is taken and each reported
//!    entry is unlinked only if it is still mapped under its key and still
//!    empty. An `update` racing in between repopulates the entry and keeps it.
//!
//! `update` holds the store read lock while it writes into the entry, so an
//! entry can never be unlinked between lookup and write.

mod entry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::metric::{Metric, Sample};

pub use entry::{MetricEntry, MetricState, BUCKET_LABEL};

/// Identity of a series inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub scope: String,
    pub name: String,
}

impl MetricKey {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MetricStore {
    entries: RwLock<HashMap<MetricKey, Arc<MetricEntry>>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live series.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Route a sample to its entry, creating the entry on first sight.
    ///
    /// `boundaries` is only read when a histogram entry is created.
    pub fn update(&self, sample: &Sample, boundaries: &[f64]) {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&Self::key_of(sample)) {
                entry.update(sample);
                return;
            }
        }

        let mut entries = self.entries.write();
        let entry = entries.entry(Self::key_of(sample)).or_insert_with(|| {
            tracing::debug!(scope = %sample.scope, name = %sample.name, mtype = sample.mtype.as_str(), "new metric entry");
            Arc::new(MetricEntry::new(sample.mtype, sample.scope.clone(), sample.name.clone(), boundaries))
        });
        entry.update(sample);
    }

    fn key_of(sample: &Sample) -> MetricKey {
        MetricKey::new(sample.scope.as_str(), sample.name.as_str())
    }

    /// Aggregated snapshot of every series. Order is unspecified.
    pub fn collect(&self) -> Vec<Metric> {
        self.collect_matching(|_, _| true)
    }

    /// Like `collect`, restricted to series for which `filter(scope, name)`
    /// holds.
    pub fn collect_matching<F>(&self, filter: F) -> Vec<Metric>
    where
        F: Fn(&str, &str) -> bool,
    {
        let entries = self.entries.read();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries.values() {
            if filter(entry.scope(), entry.name()) {
                entry.collect_into(&mut out);
            }
        }
        out
    }

    /// Evict every state with `time <= horizon`, then unlink entries left
    /// empty. Returns the number of entries removed by this call.
    pub fn cleanup(&self, horizon: SystemTime) -> usize {
        let emptied: Vec<(MetricKey, Arc<MetricEntry>)> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, entry)| entry.cleanup(horizon))
                .map(|(key, entry)| (key.clone(), Arc::clone(entry)))
                .collect()
        };

        if emptied.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for (key, reported) in emptied {
            let still_empty = entries
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &reported) && current.is_empty());
            if still_empty {
                entries.remove(&key);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "evicted empty metric entries");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelSet;
    use crate::metric::{sort_by_name_and_labels, MetricType};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    const BOUNDS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

    fn labels(pairs: &[(&str, &str)]) -> LabelSet {
        pairs.iter().copied().collect()
    }

    fn summary(metrics: &[Metric]) -> Vec<(String, String, f64)> {
        metrics
            .iter()
            .map(|m| (m.name.clone(), m.labels.to_string(), m.value))
            .collect()
    }

    #[test]
    fn aggregates_per_type() {
        let input = vec![
            Sample::counter("test", "A", 1.0),
            Sample::counter("test", "A", 2.0),
            Sample::histogram("test", "C", 0.1),
            Sample::gauge("test", "B", 1.0).with_labels(labels(&[("a", "1"), ("b", "2")])),
            Sample::counter("test", "A", 4.0).with_labels(labels(&[("id", "123")])),
            Sample::gauge("test", "B", 42.0).with_labels(labels(&[("a", "1")])),
            Sample::histogram("test", "C", 0.1),
            Sample::gauge("test", "B", 21.0).with_labels(labels(&[("a", "1"), ("b", "2")])),
            Sample::histogram("test", "C", 0.5),
            Sample::histogram("test", "C", 10.0),
        ];

        let store = MetricStore::new();
        for s in &input {
            store.update(s, &BOUNDS);
        }

        let mut metrics = store.collect();
        sort_by_name_and_labels(&mut metrics);

        let (sums, rest): (Vec<_>, Vec<_>) = summary(&metrics).into_iter().partition(|(n, _, _)| n == "C_sum");
        assert_eq!(
            rest,
            vec![
                ("A".to_string(), "{}".to_string(), 3.0),
                ("A".to_string(), r#"{id="123"}"#.to_string(), 4.0),
                ("B".to_string(), r#"{a="1"}"#.to_string(), 42.0),
                ("B".to_string(), r#"{a="1",b="2"}"#.to_string(), 21.0),
                ("C_bucket".to_string(), r#"{le="0.25"}"#.to_string(), 2.0),
                ("C_bucket".to_string(), r#"{le="0.5"}"#.to_string(), 3.0),
                ("C_bucket".to_string(), r#"{le="0.75"}"#.to_string(), 3.0),
                ("C_bucket".to_string(), r#"{le="1"}"#.to_string(), 3.0),
                ("C_count".to_string(), "{}".to_string(), 4.0),
            ]
        );
        assert_eq!(sums.len(), 1);
        assert!((sums[0].2 - 10.7).abs() < 1e-9);

        assert!(metrics.iter().filter(|m| m.name.starts_with('C')).all(|m| m.mtype == MetricType::Histogram));
    }

    #[test]
    fn collect_matching_filters_by_scope_and_name() {
        let store = MetricStore::new();
        store.update(&Sample::counter("a", "x", 1.0), &[]);
        store.update(&Sample::counter("b", "x", 1.0), &[]);
        store.update(&Sample::gauge("b", "y", 1.0), &[]);

        let got = store.collect_matching(|scope, _| scope == "b");
        assert_eq!(got.len(), 2);
        let got = store.collect_matching(|scope, name| scope == "b" && name == "y");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].mtype, MetricType::Gauge);
    }

    #[test]
    fn first_sample_fixes_entry_type() {
        let store = MetricStore::new();
        store.update(&Sample::counter("s", "n", 1.0), &[]);
        store.update(&Sample::gauge("s", "n", 5.0), &[]);
        let got = store.collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].mtype, MetricType::Counter);
        assert_eq!(got[0].value, 6.0);
    }

    #[test]
    fn concurrent_updates_share_one_entry() {
        let store = Arc::new(MetricStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        store.update(&Sample::counter("svc", "hits", 1.0), &[]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("worker panicked");
        }

        assert_eq!(store.len(), 1);
        let got = store.collect();
        assert_eq!(got[0].value, 8000.0);
    }

    #[test]
    fn cleanup_under_concurrent_callers() {
        let now = SystemTime::now();
        let store = Arc::new(MetricStore::new());
        for (name, t) in [
            ("A", now - Duration::from_secs(3600)),
            ("B", now - Duration::from_secs(60)),
            ("C", now - Duration::from_secs(1)),
            ("D", now),
            ("E", now + Duration::from_secs(1)),
        ] {
            store.update(&Sample::counter("", name, 1.0).at(t), &[]);
        }

        let horizons = [
            now - Duration::from_secs(3600),
            now - Duration::from_secs(60),
            now - Duration::from_secs(1),
            now,
        ];
        let handles: Vec<_> = horizons
            .iter()
            .flat_map(|h| [*h, *h])
            .map(|h| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.cleanup(h))
            })
            .collect();
        let removed: usize = handles.into_iter().map(|h| h.join().expect("cleanup panicked")).sum();

        assert_eq!(removed, 4);
        let metrics = store.collect();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "E");
        assert_eq!(metrics[0].value, 1.0);
        assert_eq!(metrics[0].time, now + Duration::from_secs(1));
        assert!(metrics[0].labels.is_empty());
    }

    #[test]
    fn cleanup_is_idempotent() {
        let now = SystemTime::now();
        let store = MetricStore::new();
        store.update(&Sample::counter("s", "old", 1.0).at(now - Duration::from_secs(10)), &[]);
        store.update(&Sample::counter("s", "new", 2.0).at(now + Duration::from_secs(10)), &[]);

        assert_eq!(store.cleanup(now), 1);
        let first = store.collect();
        assert_eq!(store.cleanup(now), 0);
        assert_eq!(store.collect(), first);
    }

    #[test]
    fn repopulated_entry_survives() {
        let now = SystemTime::now();
        let store = MetricStore::new();
        store.update(&Sample::gauge("s", "g", 1.0).at(now - Duration::from_secs(10)), &[]);
        assert_eq!(store.cleanup(now), 1);
        assert!(store.is_empty());

        store.update(&Sample::gauge("s", "g", 2.0).at(now), &[]);
        assert_eq!(store.collect()[0].value, 2.0);
    }

    #[test]
    fn no_deadlock_between_collect_and_cleanup() {
        const ITERATIONS: usize = 2_000;
        const TIMEOUT: Duration = Duration::from_secs(1);

        for i in 0..ITERATIONS {
            let store = Arc::new(MetricStore::new());
            store.update(
                &Sample::counter("svc", "fuzzy_deadlock", 1.0).at(SystemTime::now() - Duration::from_secs(3600)),
                &[],
            );

            let (tx, rx) = mpsc::channel();
            {
                let store = Arc::clone(&store);
                let tx = tx.clone();
                thread::spawn(move || {
                    store.collect();
                    let _ = tx.send(());
                });
            }
            {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.cleanup(SystemTime::now());
                    let _ = tx.send(());
                });
            }

            for _ in 0..2 {
                assert!(rx.recv_timeout(TIMEOUT).is_ok(), "iteration {i}: deadlock between collect and cleanup");
            }
        }
    }

    #[test]
    fn no_deadlock_with_concurrent_updates() {
        let store = Arc::new(MetricStore::new());
        let stop = SystemTime::now() + Duration::from_millis(200);

        let workers: Vec<_> = (0..4)
            .map(|w| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut n = 0u64;
                    while SystemTime::now() < stop {
                        let s = Sample::histogram("svc", format!("h{}", n % 3), n as f64)
                            .with_labels(labels(&[("worker", if w % 2 == 0 { "even" } else { "odd" })]));
                        store.update(&s, &BOUNDS);
                        n += 1;
                    }
                })
            })
            .collect();

        let reaper = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                while SystemTime::now() < stop {
                    store.cleanup(SystemTime::now());
                    store.collect();
                }
            })
        };

        for w in workers {
            w.join().expect("worker panicked");
        }
        reaper.join().expect("reaper panicked");

        store.cleanup(SystemTime::now() + Duration::from_secs(1));
        assert!(store.is_empty());
    }
}
