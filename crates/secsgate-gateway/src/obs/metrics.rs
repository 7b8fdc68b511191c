//! Metrics registry for the gateway.
//!
//! Label sets are flattened into sorted `(key, value)` vectors so rendering
//! is deterministic. Histogram buckets are fixed in microseconds to avoid
//! floating point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
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

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (render_labels(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (labels, val) in rows {
            let _ = writeln!(out, "{name}{{{labels}}} {val}");
        }
    }
}

// 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s, 5s, 30s
const BUCKETS_MICROS: [u64; 9] = [
    1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 5_000_000, 30_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration; buckets are cumulative.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = duration.as_micros() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (bucket, &le) in hist.buckets.iter().zip(BUCKETS_MICROS.iter()) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        let mut rows: Vec<(String, Vec<u64>, u64, u64)> = self
            .map
            .iter()
            .map(|r| {
                let hist = r.value();
                (
                    render_labels(r.key()),
                    hist.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
                    hist.sum.load(Ordering::Relaxed),
                    hist.count.load(Ordering::Relaxed),
                )
            })
            .collect();
        rows.sort();

        for (labels, buckets, sum, count) in rows {
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };
            for (n, le) in buckets.iter().zip(BUCKETS_MICROS.iter()) {
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {n}");
            }
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");
            let _ = writeln!(out, "{name}_sum{{{labels}}} {sum}");
            let _ = writeln!(out, "{name}_count{{{labels}}} {count}");
        }
    }
}

/// Point-in-time view of one link, rendered alongside the registry.
#[derive(Debug, Clone)]
pub struct LinkGauge {
    pub name: String,
    pub connected: bool,
    pub pending: usize,
    pub unmatched: u64,
}

#[derive(Default)]
pub struct GatewayMetrics {
    /// Labels: `from`, `outcome`.
    pub sends: CounterVec,
    /// Labels: `from`. Microseconds.
    pub reply_latency: HistogramVec,
}

impl GatewayMetrics {
    pub fn render(&self, links: &[LinkGauge]) -> String {
        let mut out = String::new();
        self.sends.render("secsgate_sends_total", &mut out);
        self.reply_latency.render("secsgate_reply_latency_micros", &mut out);

        let _ = writeln!(out, "# TYPE secsgate_pending_requests gauge");
        for l in links {
            let _ = writeln!(out, "secsgate_pending_requests{{from=\"{}\"}} {}", escape_label(&l.name), l.pending);
        }
        let _ = writeln!(out, "# TYPE secsgate_unmatched_replies_total counter");
        for l in links {
            let _ = writeln!(out, "secsgate_unmatched_replies_total{{from=\"{}\"}} {}", escape_label(&l.name), l.unmatched);
        }
        let _ = writeln!(out, "# TYPE secsgate_connection_up gauge");
        for l in links {
            let _ = writeln!(out, "secsgate_connection_up{{from=\"{}\"}} {}", escape_label(&l.name), u8::from(l.connected));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_rows_render_sorted_by_labels() {
        let metrics = GatewayMetrics::default();
        for from in ["zeta", "mid", "alpha"] {
            metrics
                .reply_latency
                .observe(&[("from", from)], Duration::from_millis(3));
        }

        let out = metrics.render(&[]);
        let counts: Vec<&str> = out
            .lines()
            .filter(|l| l.starts_with("secsgate_reply_latency_micros_count"))
            .collect();
        assert_eq!(
            counts,
            vec![
                "secsgate_reply_latency_micros_count{from=\"alpha\"} 1",
                "secsgate_reply_latency_micros_count{from=\"mid\"} 1",
                "secsgate_reply_latency_micros_count{from=\"zeta\"} 1",
            ]
        );
        assert!(out.contains("secsgate_reply_latency_micros_bucket{from=\"alpha\",le=\"1000\"} 0"));
        assert!(out.contains("secsgate_reply_latency_micros_bucket{from=\"alpha\",le=\"5000\"} 1"));
        assert!(out.contains("secsgate_reply_latency_micros_sum{from=\"alpha\"} 3000"));
    }
}
