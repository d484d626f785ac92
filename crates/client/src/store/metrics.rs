//! Store counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::LookupSource;

/// Monotonic counters updated by store operations.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    exact_hits: AtomicU64,
    normalized_hits: AtomicU64,
    fuzzy_hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl StoreMetrics {
    pub(crate) fn record_hit(&self, source: LookupSource) {
        let counter = match source {
            LookupSource::Exact => &self.exact_hits,
            LookupSource::Normalized => &self.normalized_hits,
            LookupSource::Fuzzy => &self.fuzzy_hits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, n: usize) {
        self.evictions.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_expirations(&self, n: usize) {
        self.expirations.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Combine the counters with the store's current occupancy.
    pub(crate) fn snapshot(&self, entries: usize, signed_entries: usize, bytes: usize) -> MetricsSnapshot {
        let hits = HitCounts {
            exact: self.exact_hits.load(Ordering::Relaxed),
            normalized: self.normalized_hits.load(Ordering::Relaxed),
            fuzzy: self.fuzzy_hits.load(Ordering::Relaxed),
        };
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits.total() + misses;

        MetricsSnapshot {
            hits,
            misses,
            hit_rate: if lookups == 0 { 0.0 } else { hits.total() as f64 / lookups as f64 },
            sets: self.sets.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries,
            signed_entries,
            signature_coverage: if entries == 0 { 0.0 } else { signed_entries as f64 / entries as f64 },
            bytes,
        }
    }
}

/// Hits split by lookup step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct HitCounts {
    pub exact: u64,
    pub normalized: u64,
    pub fuzzy: u64,
}

impl HitCounts {
    pub fn total(&self) -> u64 {
        self.exact + self.normalized + self.fuzzy
    }
}

/// Read-only view of the store.
#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub hits: HitCounts,
    pub misses: u64,
    pub hit_rate: f64,
    pub sets: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Entries currently held.
    pub entries: usize,
    /// Entries carrying a structural signature.
    pub signed_entries: usize,
    /// `signed_entries / entries`, 0 when empty.
    pub signature_coverage: f64,
    /// Approximate bytes in use.
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = StoreMetrics::default();
        metrics.record_hit(LookupSource::Exact);
        metrics.record_hit(LookupSource::Exact);
        metrics.record_hit(LookupSource::Fuzzy);
        metrics.record_miss();
        metrics.record_set();
        metrics.record_evictions(2);

        let snap = metrics.snapshot(4, 3, 1_000);
        assert_eq!(snap.hits, HitCounts { exact: 2, normalized: 0, fuzzy: 1 });
        assert_eq!(snap.misses, 1);
        assert!((snap.hit_rate - 0.75).abs() < 1e-9);
        assert_eq!(snap.evictions, 2);
        assert!((snap.signature_coverage - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = StoreMetrics::default().snapshot(0, 0, 0);
        assert_eq!(snap.hit_rate, 0.0);
        assert_eq!(snap.signature_coverage, 0.0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(StoreMetrics::default().snapshot(1, 1, 10)).unwrap();
        assert_eq!(json["signatureCoverage"], 1.0);
        assert_eq!(json["hits"]["fuzzy"], 0);
    }
}
