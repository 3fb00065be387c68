//! Call-site statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters recorded by a call site.
///
/// All counters are relaxed atomics; they guide tuning and tests, not
/// control flow.
#[derive(Debug, Default)]
pub struct SiteStats {
    /// Total invocations routed through the site.
    pub calls: AtomicU64,
    /// Invocations served by the monomorphic fast path.
    pub fast_hits: AtomicU64,
    /// Invocations served by the shape table.
    pub table_hits: AtomicU64,
    /// Fresh binds inserted into the shape table.
    pub binds: AtomicU64,
    /// Binds performed but not cached because the site is megamorphic.
    pub transient_binds: AtomicU64,
    /// Binds completed but discarded because a racing thread's entry for
    /// the same shape landed first.
    pub discarded_binds: AtomicU64,
    /// Fast-path guard re-checks that failed and fell through. A miss is
    /// a cache signal, never a caller-visible fault.
    pub guard_misses: AtomicU64,
}

impl SiteStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fast_hit(&self) {
        self.fast_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_table_hit(&self) {
        self.table_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_bind(&self) {
        self.binds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_transient_bind(&self) {
        self.transient_binds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_discarded_bind(&self) {
        self.discarded_binds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_guard_miss(&self) {
        self.guard_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Invocations that reused a cached plan, either path.
    pub fn cache_hits(&self) -> u64 {
        self.fast_hits.load(Ordering::Relaxed) + self.table_hits.load(Ordering::Relaxed)
    }

    /// Fraction of calls served from cache, 0.0 when no calls ran.
    pub fn hit_rate(&self) -> f64 {
        let calls = self.calls.load(Ordering::Relaxed);
        if calls == 0 {
            return 0.0;
        }
        self.cache_hits() as f64 / calls as f64
    }
}

// ============================================================================
// Tests
// ============================================================================
