//! Label sets.
//!
//! A `LabelSet` keeps labels in the order they were supplied (that is the
//! order used for output), while equality, hashing and ordering all work on a
//! canonical sorted view. Two samples carrying the same tags in a different
//! order therefore land in the same partition.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in their original order.
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.labels.iter()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.labels.push(Label::new(name, value));
    }

    /// Copy of this set with one extra label appended at the end.
    pub fn with(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.push(name, value);
        out
    }

    /// Copy of this set without any label called `name`.
    pub fn without(&self, name: &str) -> Self {
        Self {
            labels: self.labels.iter().filter(|l| l.name != name).cloned().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    fn canonical(&self) -> Vec<&Label> {
        let mut sorted: Vec<&Label> = self.labels.iter().collect();
        sorted.sort();
        sorted
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len() && self.canonical() == other.canonical()
    }
}

impl Eq for LabelSet {}

impl Hash for LabelSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for LabelSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LabelSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl<N, V> FromIterator<(N, V)> for LabelSet
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(n, v)| Label::new(n, v)).collect(),
        }
    }
}

impl From<Vec<Label>> for LabelSet {
    fn from(labels: Vec<Label>) -> Self {
        Self { labels }
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, l) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={:?}", l.name, l.value)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(l: &LabelSet) -> u64 {
        let mut h = DefaultHasher::new();
        l.hash(&mut h);
        h.finish()
    }

    #[test]
    fn equality_ignores_order() {
        let a: LabelSet = [("a", "1"), ("b", "2")].into_iter().collect();
        let b: LabelSet = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        // output order is untouched
        assert_eq!(b.iter().next().map(|l| l.name.as_str()), Some("b"));
    }

    #[test]
    fn multiset_semantics() {
        let a: LabelSet = [("a", "1"), ("a", "1")].into_iter().collect();
        let b: LabelSet = [("a", "1")].into_iter().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_set_is_distinct() {
        let empty = LabelSet::new();
        let one: LabelSet = [("id", "123")].into_iter().collect();
        assert_ne!(empty, one);
        assert!(empty < one);
    }

    #[test]
    fn without_keeps_remaining_order() {
        let a: LabelSet = [("path", "/"), ("le", "0.5"), ("code", "200")].into_iter().collect();
        let without_le = a.without("le");
        let names: Vec<&str> = without_le.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["path", "code"]);
        assert_eq!(a.without("missing"), a);
    }

    #[test]
    fn display() {
        let a: LabelSet = [("a", "1"), ("b", "x\"y")].into_iter().collect();
        assert_eq!(a.to_string(), r#"{a="1",b="x\"y"}"#);
    }
}
