//! Dynamic call sites with shape-keyed rebind caching.
//!
//! A [`CallSite`] remembers, per observed argument shape, the compiled
//! call its resolver produced, so steady-state invocations replay a plan
//! instead of re-running overload resolution. Lookup is two-tier: a
//! monomorphic fast slot holding the most recent entry, then a sharded
//! shape table. Beyond a configurable shape cap the site goes megamorphic
//! and serves unseen shapes with transient, uncached binds.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use iris_binder::assemble::BindEnv;
use iris_binder::expr::TargetId;
use iris_binder::guard::ArgShape;
use iris_binder::storage::StorageRegistry;
use iris_core::error::{RuntimeError, RuntimeResult};
use iris_core::intern::InternedString;
use iris_core::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use crate::compiled::CompiledCall;
use crate::config::SiteConfig;
use crate::context::EvalContext;
use crate::overload::OverloadSet;
use crate::stats::SiteStats;

// ============================================================================
// Classification
// ============================================================================

/// How specialized a site currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteClassification {
    /// No shape bound yet.
    Uninitialized,
    /// Exactly one shape cached.
    Monomorphic,
    /// Several shapes cached, under the cap.
    Polymorphic,
    /// At the cap; unseen shapes bind transiently and are not cached.
    Megamorphic,
}

impl std::fmt::Display for SiteClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SiteClassification::Uninitialized => "uninitialized",
            SiteClassification::Monomorphic => "monomorphic",
            SiteClassification::Polymorphic => "polymorphic",
            SiteClassification::Megamorphic => "megamorphic",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Call sites
// ============================================================================

/// One dynamic call site over an overload set.
///
/// Thread-safe throughout. Entries are behind `Arc`, so invalidation
/// never tears a plan out from under an in-flight invocation; the old
/// entry finishes its calls and drops when the last reference does.
pub struct CallSite {
    callee: Arc<OverloadSet>,
    storage: Arc<StorageRegistry>,
    config: SiteConfig,
    /// Most recent entry, re-checked by guard before the table.
    fast: RwLock<Option<Arc<CompiledCall>>>,
    /// Shape-keyed rebind cache.
    cache: DashMap<ArgShape, Arc<CompiledCall>, FxBuildHasher>,
    stats: SiteStats,
}

impl CallSite {
    /// A site with default configuration.
    pub fn new(callee: Arc<OverloadSet>, storage: Arc<StorageRegistry>) -> Self {
        Self::with_config(callee, storage, SiteConfig::default())
    }

    /// A site with explicit configuration.
    pub fn with_config(
        callee: Arc<OverloadSet>,
        storage: Arc<StorageRegistry>,
        config: SiteConfig,
    ) -> Self {
        CallSite {
            callee,
            storage,
            config,
            fast: RwLock::new(None),
            cache: DashMap::with_hasher(FxBuildHasher::default()),
            stats: SiteStats::new(),
        }
    }

    /// Interned callee name.
    #[inline]
    pub fn name(&self) -> InternedString {
        self.callee.name()
    }

    /// The overload set this site dispatches over.
    #[inline]
    pub fn callee(&self) -> &Arc<OverloadSet> {
        &self.callee
    }

    /// Site configuration.
    #[inline]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Site counters.
    #[inline]
    pub fn stats(&self) -> &SiteStats {
        &self.stats
    }

    /// Invokes the callee with `args`, reusing a cached plan when the
    /// shape guards allow it and binding otherwise.
    pub fn call(&self, ctx: &EvalContext, args: &[Value]) -> RuntimeResult<Value> {
        self.stats.record_call();

        // Tier 1: the most recent entry, one guard check away.
        if self.config.fast_path {
            let recent = self.fast.read().clone();
            if let Some(entry) = recent {
                if entry.guards_match(args) {
                    self.stats.record_fast_hit();
                    return entry.invoke(ctx, args);
                }
                // Stale guard. This is the cache telling us to look
                // further, not a caller-visible fault.
                self.stats.record_guard_miss();
            }
        }

        let entry = self.lookup_or_bind(args)?;
        entry.invoke(ctx, args)
    }

    /// Tier 2 lookup, then bind on miss.
    fn lookup_or_bind(&self, args: &[Value]) -> RuntimeResult<Arc<CompiledCall>> {
        let shape = ArgShape::of(args);

        if let Some(cached) = self.cache.get(&shape) {
            let entry = Arc::clone(cached.value());
            // Promotion locks the fast slot before the table; holding the
            // shard ref across it would invert that order.
            drop(cached);
            self.stats.record_table_hit();
            self.promote(&entry);
            return Ok(entry);
        }

        // Bind outside any cache lock. Racing threads may bind the same
        // shape concurrently; that work is disposable, blocking a shard
        // during resolution is not.
        let compiled = Arc::new(self.bind_candidate(args)?);

        // The length read races concurrent inserts, so simultaneous first
        // binds of distinct shapes can overfill the cap once, by at most
        // the number of racing binders. Any table at or past the cap
        // stops growing.
        if self.cache.len() >= self.config.shape_limit {
            self.stats.record_transient_bind();
            log::debug!(
                "[site] {} megamorphic at {} shapes; binding {} transiently",
                self.callee.name(),
                self.cache.len(),
                compiled.shape()
            );
            return Ok(compiled);
        }

        let entry = match self.cache.entry(shape) {
            Entry::Occupied(occupied) => {
                // First completed bind wins; adopt it and drop ours,
                // storage cells included.
                self.stats.record_discarded_bind();
                Arc::clone(occupied.get())
            }
            Entry::Vacant(vacant) => {
                self.stats.record_bind();
                log::debug!(
                    "[site] {} bound shape {} -> {}",
                    self.callee.name(),
                    compiled.shape(),
                    compiled.expr()
                );
                vacant.insert(Arc::clone(&compiled));
                compiled
            }
        };
        self.promote(&entry);
        Ok(entry)
    }

    /// Resolves the first candidate that binds `args` into a compiled
    /// call.
    fn bind_candidate(&self, args: &[Value]) -> RuntimeResult<CompiledCall> {
        if self.callee.is_empty() {
            return Err(RuntimeError::internal("overload set has no candidates"));
        }
        let env = BindEnv::new(&self.storage).with_context();
        let (candidate, bound) = self.callee.bind_first(args, &env).map_err(|err| {
            RuntimeError::NoMatchingOverload {
                callee: self.callee.name().as_str().to_owned(),
                supplied: args.len(),
                reason: err.to_string(),
            }
        })?;
        let overload = self
            .callee
            .candidate(candidate as usize)
            .ok_or_else(|| RuntimeError::internal("bound candidate index out of range"))?;
        Ok(CompiledCall::new(
            TargetId {
                name: self.callee.name(),
                candidate,
            },
            overload.target(),
            bound,
        ))
    }

    /// Makes `entry` the fast-slot occupant.
    ///
    /// Installs only while `entry` is still the table occupant for its
    /// shape, checked under the fast-slot lock. Invalidators mutate the
    /// table before taking that lock, so an entry removed concurrently is
    /// either rejected here or swept out right after. Lock order is fast
    /// slot, then shard; callers must not hold a table ref across this.
    fn promote(&self, entry: &Arc<CompiledCall>) {
        if !self.config.fast_path {
            return;
        }
        let mut fast = self.fast.write();
        let still_cached = self
            .cache
            .get(entry.shape())
            .is_some_and(|e| Arc::ptr_eq(e.value(), entry));
        if still_cached {
            *fast = Some(Arc::clone(entry));
        }
    }

    // ------------------------------------------------------------------
    // Invalidation and introspection
    // ------------------------------------------------------------------

    /// Drops the cached entry for one shape. Returns true if an entry was
    /// present. In-flight invocations holding the old entry finish
    /// undisturbed; the next call with this shape rebinds, constructing
    /// fresh storage.
    pub fn invalidate_shape(&self, shape: &ArgShape) -> bool {
        let removed = self.cache.remove(shape).is_some();
        if removed {
            let mut fast = self.fast.write();
            if fast.as_ref().is_some_and(|e| e.shape() == shape) {
                *fast = None;
            }
            log::debug!("[site] {} invalidated shape {}", self.callee.name(), shape);
        }
        removed
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.cache.clear();
        *self.fast.write() = None;
        log::debug!("[site] {} invalidated all shapes", self.callee.name());
    }

    /// Cached entry for a shape, if any.
    pub fn compiled_for(&self, shape: &ArgShape) -> Option<Arc<CompiledCall>> {
        self.cache.get(shape).map(|e| Arc::clone(e.value()))
    }

    /// Number of shapes currently cached.
    pub fn cached_shapes(&self) -> usize {
        self.cache.len()
    }

    /// Current specialization state.
    pub fn classification(&self) -> SiteClassification {
        let cached = self.cache.len();
        // Saturation outranks the entry count: a limit-1 site with one
        // shape is at its cap, not monomorphic.
        if cached >= self.config.shape_limit {
            return SiteClassification::Megamorphic;
        }
        match cached {
            0 => SiteClassification::Uninitialized,
            1 => SiteClassification::Monomorphic,
            _ => SiteClassification::Polymorphic,
        }
    }
}

impl std::fmt::Debug for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSite")
            .field("callee", &self.callee.name())
            .field("shapes", &self.cache.len())
            .field("classification", &self.classification())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overload::{ArgPack, Overload};
    use iris_binder::param::{ParamSpec, Signature};
    use iris_core::value::TypeTag;
    use std::sync::atomic::Ordering;

    fn host_sum(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        Ok(Value::Int(pack.int(0)? + pack.int(1)?))
    }

    fn host_negate_float(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        Ok(Value::Float(-pack.float(0)?))
    }

    fn two_int_site(config: SiteConfig) -> CallSite {
        let sig = Signature::new(vec![
            ParamSpec::positional("a"),
            ParamSpec::positional("b"),
        ])
        .unwrap();
        let set = OverloadSet::single("sum", Overload::new(sig, host_sum));
        CallSite::with_config(Arc::new(set), Arc::new(StorageRegistry::new()), config)
    }

    fn ctx() -> EvalContext {
        EvalContext::new()
    }

    #[test]
    fn test_first_call_binds_then_fast_path_serves() {
        let site = two_int_site(SiteConfig::default());
        let ctx = ctx();
        let args = [Value::Int(1), Value::Int(2)];

        assert_eq!(site.call(&ctx, &args).unwrap(), Value::Int(3));
        assert_eq!(site.call(&ctx, &args).unwrap(), Value::Int(3));
        assert_eq!(site.call(&ctx, &args).unwrap(), Value::Int(3));

        assert_eq!(site.stats().binds.load(Ordering::Relaxed), 1);
        assert_eq!(site.stats().fast_hits.load(Ordering::Relaxed), 2);
        assert_eq!(site.classification(), SiteClassification::Monomorphic);
    }

    #[test]
    fn test_fast_path_disabled_uses_table() {
        let site = two_int_site(SiteConfig {
            fast_path: false,
            ..SiteConfig::default()
        });
        let ctx = ctx();
        let args = [Value::Int(1), Value::Int(2)];

        site.call(&ctx, &args).unwrap();
        site.call(&ctx, &args).unwrap();

        assert_eq!(site.stats().fast_hits.load(Ordering::Relaxed), 0);
        assert_eq!(site.stats().table_hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_shape_change_is_a_signal_not_an_error() {
        let sig_ints = Signature::new(vec![
            ParamSpec::positional("a"),
            ParamSpec::positional("b"),
        ])
        .unwrap();
        let sig_float = Signature::new(vec![ParamSpec::positional("x")]).unwrap();
        let mut set = OverloadSet::new("poly");
        set.push(Overload::new(sig_ints, host_sum));
        set.push(Overload::new(sig_float, host_negate_float));
        let site = CallSite::new(Arc::new(set), Arc::new(StorageRegistry::new()));
        let ctx = ctx();

        assert_eq!(
            site.call(&ctx, &[Value::Int(1), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );
        // Different shape: guard miss on the fast slot, new bind, no error.
        assert_eq!(
            site.call(&ctx, &[Value::Float(2.5)]).unwrap(),
            Value::Float(-2.5)
        );
        assert_eq!(site.stats().guard_misses.load(Ordering::Relaxed), 1);
        assert_eq!(site.cached_shapes(), 2);
        assert_eq!(site.classification(), SiteClassification::Polymorphic);
    }

    #[test]
    fn test_megamorphic_binds_transiently() {
        let sig = Signature::new(vec![ParamSpec::variadic("rest")]).unwrap();
        fn host_count(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
            Ok(Value::Int(pack.rest(0)?.len() as i64))
        }
        let set = OverloadSet::single("count", Overload::new(sig, host_count));
        let site = CallSite::with_config(
            Arc::new(set),
            Arc::new(StorageRegistry::new()),
            SiteConfig::with_shape_limit(2),
        );
        let ctx = ctx();

        // Three distinct shapes by length.
        site.call(&ctx, &[Value::Int(1)]).unwrap();
        site.call(&ctx, &[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(
            site.call(&ctx, &[Value::Int(1), Value::Int(2), Value::Int(3)])
                .unwrap(),
            Value::Int(3)
        );

        assert_eq!(site.cached_shapes(), 2);
        assert_eq!(site.classification(), SiteClassification::Megamorphic);
        assert_eq!(site.stats().transient_binds.load(Ordering::Relaxed), 1);

        // The transient shape stays uncached; calling again rebinds.
        site.call(&ctx, &[Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap();
        assert_eq!(site.stats().transient_binds.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_invalidate_shape_forces_rebind() {
        let site = two_int_site(SiteConfig::default());
        let ctx = ctx();
        let args = [Value::Int(1), Value::Int(2)];

        site.call(&ctx, &args).unwrap();
        let shape = ArgShape::of(&args);
        assert!(site.invalidate_shape(&shape));
        assert!(!site.invalidate_shape(&shape));
        assert_eq!(site.cached_shapes(), 0);
        assert_eq!(site.classification(), SiteClassification::Uninitialized);

        site.call(&ctx, &args).unwrap();
        assert_eq!(site.stats().binds.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_invalidate_all_clears_fast_slot() {
        let site = two_int_site(SiteConfig::default());
        let ctx = ctx();
        let args = [Value::Int(1), Value::Int(2)];

        site.call(&ctx, &args).unwrap();
        site.invalidate_all();

        // Next call cannot hit the stale fast slot.
        site.call(&ctx, &args).unwrap();
        assert_eq!(site.stats().fast_hits.load(Ordering::Relaxed), 0);
        assert_eq!(site.stats().binds.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_unbindable_args_surface_no_matching_overload() {
        let site = two_int_site(SiteConfig::default());
        let ctx = ctx();

        let err = site.call(&ctx, &[Value::Int(1)]).unwrap_err();
        match err {
            RuntimeError::NoMatchingOverload {
                callee, supplied, ..
            } => {
                assert_eq!(callee, "sum");
                assert_eq!(supplied, 1);
            }
            other => panic!("expected NoMatchingOverload, got {other:?}"),
        }
        // Failed binds cache nothing.
        assert_eq!(site.cached_shapes(), 0);
    }

    #[test]
    fn test_empty_overload_set_is_internal_error() {
        let set = OverloadSet::new("vacant");
        let site = CallSite::new(Arc::new(set), Arc::new(StorageRegistry::new()));
        let err = site.call(&ctx(), &[]).unwrap_err();
        assert!(matches!(err, RuntimeError::Internal { .. }));
    }

    #[test]
    fn test_compiled_for_exposes_cached_entry() {
        let site = two_int_site(SiteConfig::default());
        let ctx = ctx();
        let args = [Value::Int(1), Value::Int(2)];
        site.call(&ctx, &args).unwrap();

        let shape = ArgShape::of(&args);
        let entry = site.compiled_for(&shape).unwrap();
        assert_eq!(entry.shape().tags(), &[TypeTag::Int, TypeTag::Int]);
        assert_eq!(entry.expr().to_string(), "sum#0(arg[0], arg[1])");
    }

    #[test]
    fn test_stale_promotion_after_invalidation_is_rejected() {
        let site = two_int_site(SiteConfig::default());
        let ctx = ctx();
        let args = [Value::Int(1), Value::Int(2)];
        site.call(&ctx, &args).unwrap();

        let shape = ArgShape::of(&args);
        let held = site.compiled_for(&shape).unwrap();
        assert!(site.invalidate_shape(&shape));

        // A lookup that fetched `held` from the table before the
        // invalidation may attempt its promotion afterwards. The entry is
        // no longer cached, so the fast slot must stay empty; otherwise
        // every later call with this shape would hit the revived entry
        // and never rebind.
        site.promote(&held);

        site.call(&ctx, &args).unwrap();
        assert_eq!(site.stats().fast_hits.load(Ordering::Relaxed), 0);
        assert_eq!(site.stats().binds.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_classification_with_saturated_tiny_limits() {
        let site = two_int_site(SiteConfig::with_shape_limit(1));
        let ctx = ctx();
        assert_eq!(site.classification(), SiteClassification::Uninitialized);
        site.call(&ctx, &[Value::Int(1), Value::Int(2)]).unwrap();
        // The only slot is taken; the site sits at its cap.
        assert_eq!(site.classification(), SiteClassification::Megamorphic);

        let zero = two_int_site(SiteConfig::with_shape_limit(0));
        assert_eq!(zero.classification(), SiteClassification::Megamorphic);
        zero.call(&ctx, &[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(zero.cached_shapes(), 0);
        assert_eq!(zero.stats().transient_binds.load(Ordering::Relaxed), 1);
        assert_eq!(zero.classification(), SiteClassification::Megamorphic);
    }
}
