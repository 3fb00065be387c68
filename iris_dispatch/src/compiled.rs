//! Compiled calls: a bound argument plan fused with its target.

use std::sync::Arc;

use iris_binder::assemble::BoundArgs;
use iris_binder::expr::{ArgExpr, ArgListExpr, InvokeExpr, TargetId};
use iris_binder::guard::ArgShape;
use iris_binder::storage::StorageCell;
use iris_core::error::RuntimeResult;
use iris_core::value::Value;
use smallvec::SmallVec;

use crate::context::EvalContext;
use crate::overload::{ArgPack, ArgSlot, HostFn};

/// One cacheable compiled call: the invocation plan, the native target,
/// the storage cells the plan references, and the shape guard that
/// decides reuse.
///
/// Invocation only replays the plan; it never re-derives the bind. The
/// cells live exactly as long as this value, so every invocation through
/// one compiled call shares them.
pub struct CompiledCall {
    expr: InvokeExpr,
    target: HostFn,
    shape: ArgShape,
    storage: Box<[Arc<StorageCell>]>,
}

impl CompiledCall {
    /// Fuses a bind product with its resolved target.
    pub fn new(target_id: TargetId, target: HostFn, bound: BoundArgs) -> Self {
        let (exprs, storage, shape) = bound.into_parts();
        CompiledCall {
            expr: InvokeExpr::new(target_id, exprs),
            target,
            shape,
            storage,
        }
    }

    /// The invocation plan.
    #[inline]
    pub fn expr(&self) -> &InvokeExpr {
        &self.expr
    }

    /// The argument plan portion of the invocation.
    #[inline]
    pub fn args(&self) -> &ArgListExpr {
        &self.expr.args
    }

    /// The shape guard recorded at bind time.
    #[inline]
    pub fn shape(&self) -> &ArgShape {
        &self.shape
    }

    /// Storage cells owned by this compiled call.
    #[inline]
    pub fn storage_cells(&self) -> &[Arc<StorageCell>] {
        &self.storage
    }

    /// Re-checks the shape guard against a fresh argument list.
    #[inline(always)]
    pub fn guards_match(&self, args: &[Value]) -> bool {
        self.shape.matches(args)
    }

    /// Replays the plan over one argument list and invokes the target.
    ///
    /// The caller must have verified [`Self::guards_match`]; the replay
    /// indexes positions recorded at bind time and a shorter list would
    /// panic, not misbind.
    pub fn invoke(&self, ctx: &EvalContext, args: &[Value]) -> RuntimeResult<Value> {
        debug_assert!(self.guards_match(args));
        let mut slots: SmallVec<[ArgSlot<'_>; 8]> = SmallVec::with_capacity(self.expr.args.len());
        for node in self.expr.args.iter() {
            slots.push(match *node {
                ArgExpr::Arg(i) => ArgSlot::Value(args[i as usize]),
                ArgExpr::Rest { first } => ArgSlot::Rest(&args[first as usize..]),
                ArgExpr::Context => ArgSlot::Context(ctx),
                ArgExpr::Storage(slot) => ArgSlot::Storage(&self.storage[slot as usize]),
                ArgExpr::Const(v) => ArgSlot::Value(v),
            });
        }
        (self.target)(&ArgPack::new(slots))
    }
}

impl std::fmt::Debug for CompiledCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledCall")
            .field("expr", &self.expr.to_string())
            .field("shape", &self.shape.to_string())
            .field("storage", &self.storage.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use iris_binder::assemble::{bind, BindEnv};
    use iris_binder::param::{ParamSpec, Signature};
    use iris_binder::storage::StorageRegistry;
    use iris_core::error::RuntimeResult;
    use iris_core::intern::intern;

    #[derive(Default)]
    struct Tally {
        calls: u64,
    }

    fn host_digits(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        // Encodes argument order in the result.
        let a = pack.int(0)?;
        let b = pack.int(1)?;
        let c = pack.int(2)?;
        Ok(Value::Int(a * 100 + b * 10 + c))
    }

    fn host_sum_with_rest(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        let a = pack.int(0)?;
        let rest: i64 = pack
            .rest(1)?
            .iter()
            .map(|v| v.as_int().unwrap_or(0))
            .sum();
        Ok(Value::Int(a * 1000 + rest))
    }

    fn host_tally(pack: &ArgPack<'_>) -> RuntimeResult<Value> {
        let cell = pack.storage(0)?;
        let calls = cell.with(|t: &mut Tally| {
            t.calls += 1;
            t.calls
        });
        Ok(Value::Int(calls.unwrap_or(0) as i64))
    }

    fn compile(
        sig: Signature,
        target: HostFn,
        args: &[Value],
        registry: &StorageRegistry,
    ) -> CompiledCall {
        let env = BindEnv::new(registry).with_context();
        let bound = bind(&sig, args, &env).unwrap();
        CompiledCall::new(
            TargetId {
                name: intern("t"),
                candidate: 0,
            },
            target,
            bound,
        )
    }

    #[test]
    fn test_invoke_preserves_declaration_order() {
        let registry = StorageRegistry::new();
        let sig = Signature::new(vec![
            ParamSpec::positional("a"),
            ParamSpec::positional("b"),
            ParamSpec::positional("c"),
        ])
        .unwrap();
        let args = [Value::Int(1), Value::Int(2), Value::Int(3)];
        let compiled = compile(sig, host_digits, &args, &registry);

        let ctx = EvalContext::new();
        assert_eq!(compiled.invoke(&ctx, &args).unwrap(), Value::Int(123));
        // Same shape, different payloads: the plan replays.
        let other = [Value::Int(9), Value::Int(8), Value::Int(7)];
        assert_eq!(compiled.invoke(&ctx, &other).unwrap(), Value::Int(987));
    }

    #[test]
    fn test_invoke_materializes_rest_slice() {
        let registry = StorageRegistry::new();
        let sig = Signature::new(vec![
            ParamSpec::positional("a"),
            ParamSpec::variadic("rest"),
        ])
        .unwrap();
        let args = [Value::Int(2), Value::Int(30), Value::Int(4)];
        let compiled = compile(sig, host_sum_with_rest, &args, &registry);

        let ctx = EvalContext::new();
        assert_eq!(compiled.invoke(&ctx, &args).unwrap(), Value::Int(2034));
    }

    #[test]
    fn test_invocations_share_the_storage_cell() {
        let registry = StorageRegistry::new();
        let ty = registry.register::<Tally>("Tally");
        let sig = Signature::new(vec![
            ParamSpec::storage("tally", ty),
            ParamSpec::positional("a"),
        ])
        .unwrap();
        let args = [Value::Int(0)];
        let compiled = compile(sig, host_tally, &args, &registry);

        let ctx = EvalContext::new();
        assert_eq!(compiled.invoke(&ctx, &args).unwrap(), Value::Int(1));
        assert_eq!(compiled.invoke(&ctx, &args).unwrap(), Value::Int(2));
        assert_eq!(compiled.invoke(&ctx, &args).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_guards_gate_reuse() {
        let registry = StorageRegistry::new();
        let sig = Signature::new(vec![
            ParamSpec::positional("a"),
            ParamSpec::positional("b"),
            ParamSpec::positional("c"),
        ])
        .unwrap();
        let args = [Value::Int(1), Value::Int(2), Value::Int(3)];
        let compiled = compile(sig, host_digits, &args, &registry);

        assert!(compiled.guards_match(&[Value::Int(4), Value::Int(5), Value::Int(6)]));
        assert!(!compiled.guards_match(&[Value::Int(4), Value::Float(5.0), Value::Int(6)]));
        assert!(!compiled.guards_match(&[Value::Int(4), Value::Int(5)]));
    }
}
