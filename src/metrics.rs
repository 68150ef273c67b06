//! Metrics collection and export for engine pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "metrics")]
use crate::errors::{PoolError, PoolResult};

/// Snapshot of pool counters and queue depths
///
/// Counters are relaxed atomics; a snapshot taken while other threads are
/// renting and returning may be slightly out of step with the queues.
///
/// # Examples
///
/// ```
/// use esox_inflaterpool::{InflaterPool, PoolConfiguration, Variant};
///
/// let pool = InflaterPool::new(PoolConfiguration::new().with_pool_size_per_variant(4));
///
/// let engine = pool.rent(Variant::Header);
/// pool.return_engine(engine).unwrap();
/// let _again = pool.rent(Variant::Header);
///
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.engines_created, 1);
/// assert_eq!(metrics.engines_reused, 1);
/// assert_eq!(metrics.idle_header, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolMetrics {
    /// Pool-origin engines constructed because a queue was empty
    pub engines_created: usize,

    /// Rents served from an idle queue
    pub engines_reused: usize,

    /// Returns that put an engine back into a queue
    pub engines_returned: usize,

    /// Returns dropped because the queue was at capacity
    pub engines_discarded: usize,

    /// Engines pre-created by warm-up
    pub engines_warmed: usize,

    /// Idle engines dropped by `clear`
    pub engines_cleared: usize,

    /// Returns refused with `InvalidArgument`
    pub returns_rejected: usize,

    /// Engines built while pooling was disabled
    pub freestanding_created: usize,

    /// Idle header-framed engines
    pub idle_header: usize,

    /// Idle raw engines
    pub idle_no_header: usize,

    /// Configured idle capacity per variant (0 when disabled)
    pub capacity_per_variant: usize,

    /// Share of pooled rents that skipped construction (0.0 to 1.0);
    /// rents served by warmed engines count as hits
    pub hit_rate: f64,
}

impl PoolMetrics {
    /// Engines handed out by the pool and not yet back in a queue or discarded
    pub fn outstanding(&self) -> usize {
        (self.engines_created + self.engines_reused)
            .saturating_sub(self.engines_returned + self.engines_discarded)
    }

    /// Pool-origin engines still alive, idle or held.
    ///
    /// Once callers have returned everything this equals the idle depth.
    pub fn live_engines(&self) -> usize {
        (self.engines_created + self.engines_warmed)
            .saturating_sub(self.engines_discarded + self.engines_cleared)
    }

    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("engines_created".to_string(), self.engines_created.to_string());
        metrics.insert("engines_reused".to_string(), self.engines_reused.to_string());
        metrics.insert("engines_returned".to_string(), self.engines_returned.to_string());
        metrics.insert("engines_discarded".to_string(), self.engines_discarded.to_string());
        metrics.insert("engines_warmed".to_string(), self.engines_warmed.to_string());
        metrics.insert("engines_cleared".to_string(), self.engines_cleared.to_string());
        metrics.insert("returns_rejected".to_string(), self.returns_rejected.to_string());
        metrics.insert("freestanding_created".to_string(), self.freestanding_created.to_string());
        metrics.insert("idle_header".to_string(), self.idle_header.to_string());
        metrics.insert("idle_no_header".to_string(), self.idle_no_header.to_string());
        metrics.insert("capacity_per_variant".to_string(), self.capacity_per_variant.to_string());
        metrics.insert("hit_rate".to_string(), format!("{:.2}", self.hit_rate));
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_inflaterpool::{InflaterPool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = InflaterPool::new(PoolConfiguration::default());
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("my_pool", Some(&tags)).unwrap();
    /// assert!(output.contains("inflaterpool_engines_idle"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> PoolResult<String> {
        use prometheus::{Encoder, IntCounter, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

        let registry = Registry::new();
        let labels = Self::const_labels(pool_name, tags);
        let opts = |name: &str, help: &str| Opts::new(name, help).const_labels(labels.clone());

        let counters = [
            ("inflaterpool_engines_created_total", "Engines constructed on an empty queue", metrics.engines_created),
            ("inflaterpool_engines_reused_total", "Rents served from an idle queue", metrics.engines_reused),
            ("inflaterpool_engines_returned_total", "Engines put back into a queue", metrics.engines_returned),
            ("inflaterpool_engines_discarded_total", "Returned engines dropped at capacity", metrics.engines_discarded),
            ("inflaterpool_engines_warmed_total", "Engines pre-created by warm-up", metrics.engines_warmed),
            ("inflaterpool_engines_cleared_total", "Idle engines dropped by clear", metrics.engines_cleared),
            ("inflaterpool_returns_rejected_total", "Returns refused as foreign handles", metrics.returns_rejected),
            ("inflaterpool_freestanding_created_total", "Engines built with pooling disabled", metrics.freestanding_created),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::with_opts(opts(name, help)).map_err(export_error)?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter)).map_err(export_error)?;
        }

        let idle = IntGaugeVec::new(opts("inflaterpool_engines_idle", "Idle engines per variant"), &["variant"])
            .map_err(export_error)?;
        idle.with_label_values(&["header"]).set(metrics.idle_header as i64);
        idle.with_label_values(&["no_header"]).set(metrics.idle_no_header as i64);
        registry.register(Box::new(idle)).map_err(export_error)?;

        let capacity = IntGauge::with_opts(opts("inflaterpool_capacity_per_variant", "Configured idle capacity per variant"))
            .map_err(export_error)?;
        capacity.set(metrics.capacity_per_variant as i64);
        registry.register(Box::new(capacity)).map_err(export_error)?;

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .map_err(export_error)?;
        String::from_utf8(buffer).map_err(export_error)
    }

    fn const_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.insert(key.clone(), value.clone());
            }
        }

        labels
    }
}

#[cfg(feature = "metrics")]
fn export_error(err: impl std::fmt::Display) -> PoolError {
    PoolError::MetricsExport(err.to_string())
}

/// Internal metrics tracker
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub engines_created: AtomicUsize,
    pub engines_reused: AtomicUsize,
    pub engines_returned: AtomicUsize,
    pub engines_discarded: AtomicUsize,
    pub engines_warmed: AtomicUsize,
    pub engines_cleared: AtomicUsize,
    pub returns_rejected: AtomicUsize,
    pub freestanding_created: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_metrics(&self, idle_header: usize, idle_no_header: usize, capacity: usize) -> PoolMetrics {
        let created = self.engines_created.load(Ordering::Relaxed);
        let reused = self.engines_reused.load(Ordering::Relaxed);
        let hit_rate = if created + reused > 0 {
            reused as f64 / (created + reused) as f64
        } else {
            0.0
        };

        PoolMetrics {
            engines_created: created,
            engines_reused: reused,
            engines_returned: self.engines_returned.load(Ordering::Relaxed),
            engines_discarded: self.engines_discarded.load(Ordering::Relaxed),
            engines_warmed: self.engines_warmed.load(Ordering::Relaxed),
            engines_cleared: self.engines_cleared.load(Ordering::Relaxed),
            returns_rejected: self.returns_rejected.load(Ordering::Relaxed),
            freestanding_created: self.freestanding_created.load(Ordering::Relaxed),
            idle_header,
            idle_no_header,
            capacity_per_variant: capacity,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let tracker = MetricsTracker::new();
        assert_eq!(tracker.get_metrics(0, 0, 4).hit_rate, 0.0);

        tracker.engines_created.fetch_add(1, Ordering::Relaxed);
        tracker.engines_reused.fetch_add(3, Ordering::Relaxed);

        let metrics = tracker.get_metrics(1, 0, 4);
        assert_eq!(metrics.hit_rate, 0.75);
        assert_eq!(metrics.export()["hit_rate"], "0.75");
    }

    #[test]
    fn test_outstanding() {
        let tracker = MetricsTracker::new();
        tracker.engines_created.fetch_add(3, Ordering::Relaxed);
        tracker.engines_reused.fetch_add(2, Ordering::Relaxed);
        tracker.engines_returned.fetch_add(3, Ordering::Relaxed);
        tracker.engines_discarded.fetch_add(1, Ordering::Relaxed);

        assert_eq!(tracker.get_metrics(0, 0, 2).outstanding(), 1);
    }

    #[test]
    fn test_live_engines_include_warmed_and_cleared() {
        let tracker = MetricsTracker::new();
        tracker.engines_created.fetch_add(2, Ordering::Relaxed);
        tracker.engines_warmed.fetch_add(4, Ordering::Relaxed);
        tracker.engines_discarded.fetch_add(1, Ordering::Relaxed);
        tracker.engines_cleared.fetch_add(3, Ordering::Relaxed);

        let metrics = tracker.get_metrics(2, 0, 4);
        assert_eq!(metrics.live_engines(), 2);
        assert_eq!(metrics.export()["engines_warmed"], "4");
        assert_eq!(metrics.export()["engines_cleared"], "3");
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_prometheus_export() {
        let tracker = MetricsTracker::new();
        tracker.engines_created.fetch_add(2, Ordering::Relaxed);
        let metrics = tracker.get_metrics(1, 2, 8);

        let output = MetricsExporter::export_prometheus(&metrics, "decoders", None).unwrap();

        assert!(output.contains("# TYPE inflaterpool_engines_created_total counter"));
        assert!(output.contains("pool=\"decoders\""));
        assert!(output.contains("variant=\"no_header\""));
        assert!(output.contains("inflaterpool_capacity_per_variant"));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_prometheus_rejects_bad_label() {
        let metrics = MetricsTracker::new().get_metrics(0, 0, 1);
        let mut tags = HashMap::new();
        tags.insert("not a label".to_string(), "x".to_string());

        let result = MetricsExporter::export_prometheus(&metrics, "decoders", Some(&tags));
        assert!(matches!(result, Err(PoolError::MetricsExport(_))));
    }
}
