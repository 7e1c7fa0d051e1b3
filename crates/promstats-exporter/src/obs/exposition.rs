//! Prometheus text exposition (format 0.0.4).
//!
//! Rows are grouped by sanitized family name before writing, so every family
//! (including the `_bucket`/`_count`/`_sum` series of a histogram) gets exactly
//! one `# TYPE` line. Within a histogram partition, buckets come out in
//! ascending boundary order followed by `_count` and `_sum`.
//!
//! When two sources sanitize to the same family with different types, the
//! first type in counter/gauge/histogram order keeps the family and the other
//! rows are dropped with a warning. Counter and gauge families that would
//! shadow a histogram's `_bucket`/`_count`/`_sum` series are dropped the same
//! way.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use promstats_core::buckets::format_boundary;
use promstats_core::store::BUCKET_LABEL;
use promstats_core::{LabelSet, Metric, MetricType};

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const HISTOGRAM_SUFFIXES: [&str; 3] = ["_bucket", "_count", "_sum"];

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Replace characters outside `[a-zA-Z0-9_:]` with `_`; prefix a leading
/// digit with `_`.
pub fn sanitize_name(name: &str) -> String {
    sanitize(name, true)
}

/// Like `sanitize_name`, without `:`.
pub fn sanitize_label_name(name: &str) -> String {
    sanitize(name, false)
}

fn sanitize(name: &str, allow_colon: bool) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || (allow_colon && c == ':') {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// Full series name: `scope_name`, or `name` alone for an empty scope.
pub fn series_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        sanitize_name(name)
    } else {
        sanitize_name(&format!("{scope}_{name}"))
    }
}

/// One metric with its sort key precomputed.
struct Row<'a> {
    family: String,
    series: String,
    partition: LabelSet,
    suffix: usize,
    bound: f64,
    metric: &'a Metric,
}

impl<'a> Row<'a> {
    fn new(metric: &'a Metric) -> Self {
        let series = series_name(&metric.scope, &metric.name);
        let mut family = series.clone();
        let mut suffix = 0;
        if metric.mtype == MetricType::Histogram {
            if let Some((i, base)) = HISTOGRAM_SUFFIXES
                .into_iter()
                .enumerate()
                .find_map(|(i, s)| series.strip_suffix(s).map(|base| (i, base)))
            {
                family = base.to_string();
                suffix = i;
            }
        }

        let (partition, bound) = match metric.labels.get(BUCKET_LABEL) {
            Some(le) if metric.mtype == MetricType::Histogram => {
                (metric.labels.without(BUCKET_LABEL), parse_boundary(le))
            }
            _ => (metric.labels.clone(), 0.0),
        };

        Self {
            family,
            series,
            partition,
            suffix,
            bound,
            metric,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.family
            .cmp(&other.family)
            .then_with(|| type_rank(self.metric.mtype).cmp(&type_rank(other.metric.mtype)))
            .then_with(|| self.partition.cmp(&other.partition))
            .then_with(|| self.suffix.cmp(&other.suffix))
            .then_with(|| self.bound.total_cmp(&other.bound))
    }
}

fn type_rank(t: MetricType) -> u8 {
    match t {
        MetricType::Counter => 0,
        MetricType::Gauge => 1,
        MetricType::Histogram => 2,
    }
}

fn parse_boundary(le: &str) -> f64 {
    match le {
        "+Inf" => f64::INFINITY,
        _ => le.parse().unwrap_or(f64::NAN),
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format_boundary(v)
    }
}

fn render_labels(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(|l| format!("{}=\"{}\"", sanitize_label_name(&l.name), escape_label(&l.value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Append `metrics` to `out` in text format. Input order does not matter.
pub fn write_text(metrics: &[Metric], out: &mut String) {
    let mut rows: Vec<Row<'_>> = metrics.iter().map(Row::new).collect();
    rows.sort_by(|a, b| a.cmp_key(b));

    // Series names owned by histogram families.
    let reserved: HashSet<String> = rows
        .iter()
        .filter(|r| r.metric.mtype == MetricType::Histogram)
        .flat_map(|r| HISTOGRAM_SUFFIXES.into_iter().map(move |s| format!("{}{}", r.family, s)))
        .collect();

    let mut families: HashMap<&str, MetricType> = HashMap::new();
    let mut warned: HashSet<&str> = HashSet::new();

    for r in &rows {
        let m = r.metric;
        let shadowed = m.mtype != MetricType::Histogram && reserved.contains(&r.family);
        match families.get(r.family.as_str()).copied() {
            Some(t) if t == m.mtype && !shadowed => {}
            None if !shadowed => {
                let _ = writeln!(out, "# TYPE {} {}", r.family, m.mtype.as_str());
                families.insert(r.family.as_str(), m.mtype);
            }
            _ => {
                if warned.insert(r.family.as_str()) {
                    tracing::warn!(
                        family = %r.family,
                        scope = %m.scope,
                        name = %m.name,
                        mtype = m.mtype.as_str(),
                        "metric family collides with another type; series dropped"
                    );
                }
                continue;
            }
        }

        let label_str = render_labels(&m.labels);
        if label_str.is_empty() {
            let _ = writeln!(out, "{} {}", r.series, format_value(m.value));
        } else {
            let _ = writeln!(out, "{}{{{}}} {}", r.series, label_str, format_value(m.value));
        }
    }
}

pub fn render(metrics: &[Metric]) -> String {
    let mut out = String::new();
    write_text(metrics, &mut out);
    out
}
