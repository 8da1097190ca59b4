//! Prometheus Metrics Store
//!
//! Implements MetricsStore with Prometheus text exposition.

use crate::domain::ports::MetricsStore;
use crate::domain::value_objects::Source;
use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Latency totals for one source.
#[derive(Debug, Default)]
pub struct DurationMetrics {
    /// Sum of observed durations in microseconds
    pub sum_micros: AtomicU64,
    /// Number of observations
    pub count: AtomicU64,
}

impl DurationMetrics {
    fn observe(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn sum_seconds(&self) -> f64 {
        self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }
}

/// Prometheus-compatible metrics store.
#[derive(Debug, Default)]
pub struct PrometheusMetricsStore {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    /// (country, source) -> successful resolutions
    requests: DashMap<(String, Source), AtomicU64>,
    /// source -> latency totals
    durations: DashMap<Source, DurationMetrics>,
}

impl PrometheusMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Successful resolutions recorded for a (country, source) pair.
    pub fn requests_for(&self, country: &str, source: Source) -> u64 {
        self.requests
            .get(&(country.to_string(), source))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Export metrics in Prometheus text format.
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP ip_geolocation_cache_hits_total Total number of cache hits\n");
        output.push_str("# TYPE ip_geolocation_cache_hits_total counter\n");
        let _ = writeln!(output, "ip_geolocation_cache_hits_total {}", self.cache_hits());

        output.push_str("# HELP ip_geolocation_cache_misses_total Total number of cache misses\n");
        output.push_str("# TYPE ip_geolocation_cache_misses_total counter\n");
        let _ = writeln!(output, "ip_geolocation_cache_misses_total {}", self.cache_misses());

        output.push_str("# HELP ip_geolocation_requests_total Total number of IP geolocation requests\n");
        output.push_str("# TYPE ip_geolocation_requests_total counter\n");
        let mut requests: Vec<(String, Source, u64)> = self
            .requests
            .iter()
            .map(|e| (e.key().0.clone(), e.key().1, e.value().load(Ordering::Relaxed)))
            .collect();
        requests.sort_by(|a, b| (a.0.as_str(), a.1.as_str()).cmp(&(b.0.as_str(), b.1.as_str())));
        for (country, source, count) in requests {
            let _ = writeln!(
                output,
                "ip_geolocation_requests_total{{country=\"{}\",source=\"{}\"}} {}",
                escape_label(&country),
                source,
                count
            );
        }

        output.push_str("# HELP ip_geolocation_request_duration_seconds Duration of IP geolocation requests\n");
        output.push_str("# TYPE ip_geolocation_request_duration_seconds summary\n");
        for source in [Source::Cache, Source::External] {
            if let Some(d) = self.durations.get(&source) {
                let _ = writeln!(
                    output,
                    "ip_geolocation_request_duration_seconds_sum{{source=\"{}\"}} {:.6}",
                    source,
                    d.sum_seconds()
                );
                let _ = writeln!(
                    output,
                    "ip_geolocation_request_duration_seconds_count{{source=\"{}\"}} {}",
                    source,
                    d.count.load(Ordering::Relaxed)
                );
            }
        }

        output
    }
}

/// Escape a label value per the Prometheus text format.
fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl MetricsStore for PrometheusMetricsStore {
    fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_request(&self, source: Source, country: &str, elapsed: Duration) {
        self.requests
            .entry((country.to_string(), source))
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
        self.durations.entry(source).or_default().observe(elapsed);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let store = PrometheusMetricsStore::new();
        assert_eq!(store.cache_hits(), 0);
        assert_eq!(store.cache_misses(), 0);
        assert_eq!(store.requests_for("United States", Source::Cache), 0);
    }

    #[test]
    fn test_hit_miss_counters() {
        let store = PrometheusMetricsStore::new();

        store.record_hit();
        store.record_hit();
        store.record_miss();

        assert_eq!(store.cache_hits(), 2);
        assert_eq!(store.cache_misses(), 1);
    }

    #[test]
    fn test_request_counters_by_country_and_source() {
        let store = PrometheusMetricsStore::new();

        store.record_request(Source::External, "United States", Duration::from_millis(120));
        store.record_request(Source::Cache, "United States", Duration::from_millis(2));
        store.record_request(Source::Cache, "United States", Duration::from_millis(3));

        assert_eq!(store.requests_for("United States", Source::Cache), 2);
        assert_eq!(store.requests_for("United States", Source::External), 1);
        assert_eq!(store.requests_for("Germany", Source::Cache), 0);
    }

    #[test]
    fn test_export_prometheus() {
        let store = PrometheusMetricsStore::new();
        store.record_miss();
        store.record_request(Source::External, "United States", Duration::from_millis(500));
        store.record_hit();
        store.record_request(Source::Cache, "United States", Duration::from_millis(1));

        let output = store.export_prometheus();

        assert!(output.contains("# TYPE ip_geolocation_cache_hits_total counter"));
        assert!(output.contains("ip_geolocation_cache_hits_total 1\n"));
        assert!(output.contains("ip_geolocation_cache_misses_total 1\n"));
        assert!(output.contains(
            "ip_geolocation_requests_total{country=\"United States\",source=\"external_api\"} 1"
        ));
        assert!(output.contains(
            "ip_geolocation_requests_total{country=\"United States\",source=\"cache\"} 1"
        ));
        assert!(output.contains(
            "ip_geolocation_request_duration_seconds_sum{source=\"external_api\"} 0.500000"
        ));
        assert!(output.contains(
            "ip_geolocation_request_duration_seconds_count{source=\"cache\"} 1"
        ));
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label("C\u{f4}te d'Ivoire"), "C\u{f4}te d'Ivoire");
        assert_eq!(escape_label("a\"b"), "a\\\"b");
        assert_eq!(escape_label("a\\b"), "a\\\\b");
        assert_eq!(escape_label("a\nb"), "a\\nb");
    }
}
