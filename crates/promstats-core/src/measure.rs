//! Measures as reported by instrumented code.
//!
//! A measure groups several numeric fields observed at once under a common
//! name and tag set (e.g. one HTTP round trip yields a request counter and a
//! latency histogram).

use crate::labels::LabelSet;
use crate::metric::MetricType;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// How a field aggregates once it reaches a metric store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Counter,
    Gauge,
    Histogram,
}

impl From<FieldKind> for MetricType {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Counter => MetricType::Counter,
            FieldKind::Gauge => MetricType::Gauge,
            FieldKind::Histogram => MetricType::Histogram,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: f64,
    pub kind: FieldKind,
}

impl Field {
    pub fn counter(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value, kind: FieldKind::Counter }
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value, kind: FieldKind::Gauge }
    }

    pub fn histogram(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value, kind: FieldKind::Histogram }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Measure {
    pub name: String,
    pub fields: Vec<Field>,
    pub tags: Vec<Tag>,
}

impl Measure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name, value));
        self
    }

    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }

    /// Tags as a label set, in tag order.
    pub fn labels(&self) -> LabelSet {
        self.tags
            .iter()
            .map(|t| (t.name.as_str(), t.value.as_str()))
            .collect()
    }
}
