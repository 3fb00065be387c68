//! Overload candidates, native targets, and the materialized argument
//! pack a target receives.

use std::sync::Arc;

use iris_binder::assemble::{bind, BindEnv, BoundArgs};
use iris_binder::error::BindError;
use iris_binder::param::{ArityRange, Signature};
use iris_binder::storage::StorageCell;
use iris_core::error::{RuntimeError, RuntimeResult};
use iris_core::intern::{intern, InternedString};
use iris_core::value::Value;
use smallvec::SmallVec;

use crate::context::EvalContext;

// ============================================================================
// Argument packs
// ============================================================================

/// One materialized argument, in declaration order.
#[derive(Clone, Copy)]
pub enum ArgSlot<'call> {
    /// A caller-supplied or defaulted value.
    Value(Value),
    /// The collected variadic tail.
    Rest(&'call [Value]),
    /// The ambient execution context.
    Context(&'call EvalContext),
    /// The per-call-site storage cell bound into the compiled call.
    Storage(&'call StorageCell),
}

/// The exact argument list a native target receives: one slot per formal
/// parameter, in declaration order, synthetic slots already filled.
pub struct ArgPack<'call> {
    slots: SmallVec<[ArgSlot<'call>; 8]>,
}

impl<'call> ArgPack<'call> {
    /// Wraps a declaration-ordered slot list. Normally built by the
    /// compiled call right before invoking its target.
    pub fn new(slots: SmallVec<[ArgSlot<'call>; 8]>) -> Self {
        ArgPack { slots }
    }

    /// Number of formal parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the target declares no parameters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Raw slot at `ordinal`.
    #[inline]
    pub fn slot(&self, ordinal: usize) -> Option<ArgSlot<'call>> {
        self.slots.get(ordinal).copied()
    }

    fn slot_or_err(&self, ordinal: usize) -> RuntimeResult<ArgSlot<'call>> {
        self.slot(ordinal)
            .ok_or_else(|| RuntimeError::internal("argument ordinal out of range"))
    }

    /// Plain value at `ordinal`.
    pub fn value(&self, ordinal: usize) -> RuntimeResult<Value> {
        match self.slot_or_err(ordinal)? {
            ArgSlot::Value(v) => Ok(v),
            _ => Err(RuntimeError::internal(
                "argument slot does not hold a plain value",
            )),
        }
    }

    /// Integer value at `ordinal`.
    pub fn int(&self, ordinal: usize) -> RuntimeResult<i64> {
        let v = self.value(ordinal)?;
        v.as_int().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "argument {} must be int, not {}",
                ordinal,
                v.type_tag().name()
            ))
        })
    }

    /// Float value at `ordinal`.
    pub fn float(&self, ordinal: usize) -> RuntimeResult<f64> {
        let v = self.value(ordinal)?;
        v.as_float().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "argument {} must be float, not {}",
                ordinal,
                v.type_tag().name()
            ))
        })
    }

    /// String value at `ordinal`.
    pub fn string(&self, ordinal: usize) -> RuntimeResult<&'static str> {
        let v = self.value(ordinal)?;
        v.as_str().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "argument {} must be str, not {}",
                ordinal,
                v.type_tag().name()
            ))
        })
    }

    /// The variadic tail at `ordinal`.
    pub fn rest(&self, ordinal: usize) -> RuntimeResult<&'call [Value]> {
        match self.slot_or_err(ordinal)? {
            ArgSlot::Rest(values) => Ok(values),
            _ => Err(RuntimeError::internal(
                "argument slot does not hold a variadic tail",
            )),
        }
    }

    /// The ambient context at `ordinal`.
    pub fn context(&self, ordinal: usize) -> RuntimeResult<&'call EvalContext> {
        match self.slot_or_err(ordinal)? {
            ArgSlot::Context(ctx) => Ok(ctx),
            _ => Err(RuntimeError::internal(
                "argument slot does not hold the execution context",
            )),
        }
    }

    /// The storage cell at `ordinal`.
    pub fn storage(&self, ordinal: usize) -> RuntimeResult<&'call StorageCell> {
        match self.slot_or_err(ordinal)? {
            ArgSlot::Storage(cell) => Ok(cell),
            _ => Err(RuntimeError::internal(
                "argument slot does not hold a storage cell",
            )),
        }
    }
}

// ============================================================================
// Targets and candidates
// ============================================================================

/// Native function a compiled call dispatches to.
pub type HostFn = fn(&ArgPack<'_>) -> RuntimeResult<Value>;

/// One overload candidate: a native target behind a formal signature.
pub struct Overload {
    signature: Signature,
    target: HostFn,
}

impl Overload {
    /// Pairs a signature with its native target.
    pub fn new(signature: Signature, target: HostFn) -> Self {
        Overload { signature, target }
    }

    /// The candidate's formal signature.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The candidate's native target.
    #[inline]
    pub fn target(&self) -> HostFn {
        self.target
    }
}

impl std::fmt::Debug for Overload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overload")
            .field("signature", &self.signature.to_string())
            .finish_non_exhaustive()
    }
}

/// Ordered candidate list for one callee name.
///
/// Candidates are tried in declaration order; the first one that binds
/// wins. There is no ranking beyond that order.
#[derive(Debug)]
pub struct OverloadSet {
    name: InternedString,
    candidates: Vec<Overload>,
}

impl OverloadSet {
    /// An empty set for `name`.
    pub fn new(name: &str) -> Self {
        OverloadSet {
            name: intern(name),
            candidates: Vec::new(),
        }
    }

    /// A set with a single candidate.
    pub fn single(name: &str, overload: Overload) -> Self {
        let mut set = Self::new(name);
        set.push(overload);
        set
    }

    /// Appends a candidate. Order of insertion is order of resolution.
    pub fn push(&mut self, overload: Overload) {
        self.candidates.push(overload);
    }

    /// Interned callee name.
    #[inline]
    pub fn name(&self) -> InternedString {
        self.name
    }

    /// Candidates in resolution order.
    #[inline]
    pub fn candidates(&self) -> &[Overload] {
        &self.candidates
    }

    /// Candidate at `index`.
    #[inline]
    pub fn candidate(&self, index: usize) -> Option<&Overload> {
        self.candidates.get(index)
    }

    /// Number of candidates.
    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True if the set has no candidates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Tries each candidate in order, returning the index and bind
    /// product of the first that accepts the argument list.
    ///
    /// On total failure the rejection reported is the *last* candidate's;
    /// earlier rejections are logged. An empty set rejects everything.
    pub fn bind_first(
        &self,
        args: &[Value],
        env: &BindEnv<'_>,
    ) -> Result<(u16, BoundArgs), BindError> {
        let mut last_err: Option<BindError> = None;
        for (index, overload) in self.candidates.iter().enumerate() {
            match bind(overload.signature(), args, env) {
                Ok(bound) => return Ok((index as u16, bound)),
                Err(err) => {
                    log::debug!(
                        "[dispatch] {}#{} rejected {} args: {}",
                        self.name,
                        index,
                        args.len(),
                        err
                    );
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(BindError::ArityMismatch {
            expected: ArityRange {
                min: 0,
                max: Some(0),
            },
            supplied: args.len(),
        }))
    }
}

/// Shared handle to an overload set.
pub type OverloadSetRef = Arc<OverloadSet>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use iris_binder::param::ParamSpec;
    use iris_binder::storage::StorageRegistry;
    use smallvec::smallvec;

    fn host_first(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        pack.value(0)
    }

    fn host_second(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        pack.value(1)
    }

    fn sig_of_arity(n: usize) -> Signature {
        let params = (0..n)
            .map(|i| ParamSpec::positional(&format!("p{i}")))
            .collect();
        Signature::new(params).unwrap()
    }

    #[test]
    fn test_pack_value_accessors() {
        let values = [Value::Int(5), Value::Float(0.5)];
        let pack = ArgPack::new(smallvec![
            ArgSlot::Value(values[0]),
            ArgSlot::Value(values[1]),
            ArgSlot::Rest(&values),
        ]);

        assert_eq!(pack.len(), 3);
        assert_eq!(pack.int(0).unwrap(), 5);
        assert_eq!(pack.float(1).unwrap(), 0.5);
        assert_eq!(pack.rest(2).unwrap().len(), 2);

        // Wrong accessor for the slot kind.
        assert!(pack.int(1).is_err());
        assert!(pack.rest(0).is_err());
        assert!(pack.value(3).is_err());
    }

    #[test]
    fn test_pack_context_slot() {
        let ctx = EvalContext::new();
        ctx.set_global("g", 7i64);
        let pack = ArgPack::new(smallvec![ArgSlot::Context(&ctx)]);
        let got = pack.context(0).unwrap();
        assert_eq!(got.global("g"), Some(Value::Int(7)));
    }

    #[test]
    fn test_bind_first_prefers_declaration_order() {
        let registry = StorageRegistry::new();
        let env = BindEnv::new(&registry);
        let mut set = OverloadSet::new("pick");
        set.push(Overload::new(sig_of_arity(2), host_first));
        set.push(Overload::new(sig_of_arity(3), host_second));

        let (idx, _) = set
            .bind_first(&[Value::Int(1), Value::Int(2)], &env)
            .unwrap();
        assert_eq!(idx, 0);

        let (idx, _) = set
            .bind_first(&[Value::Int(1), Value::Int(2), Value::Int(3)], &env)
            .unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_bind_first_reports_last_rejection() {
        let registry = StorageRegistry::new();
        let env = BindEnv::new(&registry);
        let mut set = OverloadSet::new("pick");
        set.push(Overload::new(sig_of_arity(2), host_first));
        set.push(Overload::new(sig_of_arity(3), host_second));

        let err = set.bind_first(&[Value::Int(1)], &env).unwrap_err();
        assert!(matches!(
            err,
            BindError::ArityMismatch { supplied: 1, expected } if expected.min == 3
        ));
    }

    #[test]
    fn test_empty_set_rejects() {
        let registry = StorageRegistry::new();
        let env = BindEnv::new(&registry);
        let set = OverloadSet::new("nothing");
        assert!(set.bind_first(&[], &env).is_err());
    }
}
