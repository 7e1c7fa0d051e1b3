//! Histogram bucket resolution.

/// Boundaries that `value` is less than or equal to.
///
/// `boundaries` must be sorted ascending; the result is the tail of the slice
/// starting at the first boundary `>= value`. `f64::INFINITY` matches every
/// finite value. NaN matches nothing.
pub fn le(boundaries: &[f64], value: f64) -> &[f64] {
    if value.is_nan() {
        return &[];
    }
    let first = boundaries.partition_point(|b| *b < value);
    &boundaries[first..]
}

/// Cumulative counts per boundary for a set of observations.
pub fn cumulative_counts<I>(boundaries: &[f64], values: I) -> Vec<u64>
where
    I: IntoIterator<Item = f64>,
{
    let mut counts = vec![0u64; boundaries.len()];
    for v in values {
        let matched = le(boundaries, v).len();
        let start = boundaries.len() - matched;
        for c in &mut counts[start..] {
            *c += 1;
        }
    }
    counts
}

/// Format a boundary for an `le` label: `+Inf`/`-Inf` for infinities and the
/// shortest round-trip decimal otherwise (`1.0` renders as `1`).
pub fn format_boundary(b: f64) -> String {
    if b == f64::INFINITY {
        "+Inf".to_string()
    } else if b == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        b.to_string()
    }
}

/// Whether a boundary list is usable (non-empty, no NaN, strictly ascending).
pub fn is_valid(boundaries: &[f64]) -> bool {
    !boundaries.is_empty()
        && boundaries.iter().all(|b| !b.is_nan())
        && boundaries.windows(2).all(|w| w[0] < w[1])
}
