//! Minimal metrics registry for the gateway.
//!
//! Counters and latency histograms keyed by label sets in a `DashMap`. Label
//! pairs are sorted so the same set always lands on the same series.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| {
            let v = v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
            format!("{k}=\"{v}\"")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    series: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        self.series
            .entry(label_key(labels))
            .or_default()
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.series
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for s in self.series.iter() {
            let _ = writeln!(
                out,
                "{name}{{{}}} {}",
                render_labels(s.key()),
                s.value().load(Ordering::Relaxed)
            );
        }
    }
}

// upper bounds in microseconds: 50us .. 250ms
const BUCKETS_MICROS: [u64; 8] = [50, 100, 250, 1_000, 5_000, 25_000, 100_000, 250_000];

#[derive(Default)]
struct Histogram {
    count: AtomicU64,
    sum_micros: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MICROS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    series: DashMap<LabelKey, Histogram>,
}

impl HistogramVec {
    pub fn observe(&self, labels: &[(&str, &str)], elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let h = self.series.entry(label_key(labels)).or_default();
        h.count.fetch_add(1, Ordering::Relaxed);
        h.sum_micros.fetch_add(micros, Ordering::Relaxed);
        for (bucket, &le) in h.buckets.iter().zip(BUCKETS_MICROS.iter()) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for s in self.series.iter() {
            let labels = render_labels(s.key());
            let sep = if labels.is_empty() { "" } else { "," };
            let h = s.value();
            for (bucket, le) in h.buckets.iter().zip(BUCKETS_MICROS.iter()) {
                let _ = writeln!(
                    out,
                    "{name}_bucket{{{labels}{sep}le=\"{le}\"}} {}",
                    bucket.load(Ordering::Relaxed)
                );
            }
            let count = h.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{labels}{sep}le=\"+Inf\"}} {count}");
            let _ = writeln!(out, "{name}_sum{{{labels}}} {}", h.sum_micros.load(Ordering::Relaxed));
            let _ = writeln!(out, "{name}_count{{{labels}}} {count}");
        }
    }
}

#[derive(Default)]
pub struct GuardMetrics {
    /// by route
    pub requests: CounterVec,
    /// by route and client code
    pub rejections: CounterVec,
    /// by entity
    pub dropped_fields: CounterVec,
    pub executor_errors: CounterVec,
    /// enforcement only, executor time excluded
    pub enforce_duration: HistogramVec,
    draining: AtomicBool,
}

impl GuardMetrics {
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    /// Prometheus text for every series plus caller-provided gauges.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.requests.render("dsoguard_requests_total", &mut out);
        self.rejections.render("dsoguard_rejections_total", &mut out);
        self.dropped_fields.render("dsoguard_dropped_fields_total", &mut out);
        self.executor_errors.render("dsoguard_executor_errors_total", &mut out);
        self.enforce_duration.render("dsoguard_enforce_duration_micros", &mut out);

        let _ = writeln!(out, "# TYPE dsoguard_draining gauge");
        let _ = writeln!(out, "dsoguard_draining {}", u8::from(self.is_draining()));
        for (k, v) in extra {
            let _ = writeln!(out, "# TYPE {k} gauge");
            let _ = writeln!(out, "{k} {v}");
        }
        out
    }
}
