//! Measure fan-out.
//!
//! The engine is constructed explicitly and shared by `Arc`; there is no
//! process-wide default instance.

use std::sync::Arc;
use std::time::SystemTime;

use crate::measure::{Measure, Tag};

/// Receives batches of measures reported through an `Engine`.
pub trait Handler: Send + Sync {
    fn handle_measures(&self, time: SystemTime, measures: &[Measure]);
}

#[derive(Clone, Default)]
pub struct Engine {
    prefix: String,
    tags: Vec<Tag>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("prefix", &self.prefix)
            .field("tags", &self.tags)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Engine {
    pub fn new(prefix: impl Into<String>, handlers: Vec<Arc<dyn Handler>>) -> Self {
        Self {
            prefix: prefix.into(),
            tags: Vec::new(),
            handlers,
        }
    }

    /// Tags appended to every reported measure.
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn report(&self, measure: Measure) {
        self.report_at(SystemTime::now(), vec![measure]);
    }

    /// Normalize `measures` (prefix, base tags, tag order) and hand them to
    /// every handler.
    pub fn report_at(&self, time: SystemTime, mut measures: Vec<Measure>) {
        if self.handlers.is_empty() || measures.is_empty() {
            return;
        }

        for m in &mut measures {
            if !self.prefix.is_empty() {
                m.name = if m.name.is_empty() {
                    self.prefix.clone()
                } else {
                    format!("{}.{}", self.prefix, m.name)
                };
            }
            m.tags.extend(self.tags.iter().cloned());
            m.tags.sort_by(|a, b| a.name.cmp(&b.name));
        }

        for h in &self.handlers {
            h.handle_measures(time, &measures);
        }
    }
}
