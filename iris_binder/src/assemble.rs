//! The binding assembler.
//!
//! Turns one candidate signature plus one observed argument list into an
//! argument plan:
//!
//! 1. instantiate a builder per formal parameter, constructing storage
//!    cells as their parameters are recognized;
//! 2. order the builders by priority (stable, so ties keep declaration
//!    order);
//! 3. partition the caller-supplied positions among the consuming
//!    builders, front to back, marking a consumed bitmap;
//! 4. verify every supplied position was claimed;
//! 5. have each builder emit its node, reassembled in declaration order.
//!
//! The assembler owns all mutation: builders only read their claims.

use std::sync::Arc;

use iris_core::value::Value;
use smallvec::{smallvec, SmallVec};

use crate::builder::{ArgBuilder, BuilderSlot, Consumption};
use crate::error::{BindError, BindResult};
use crate::expr::{ArgExpr, ArgListExpr};
use crate::guard::ArgShape;
use crate::param::{ParamKind, Signature};
use crate::storage::{StorageCell, StorageRegistry};

// ============================================================================
// Binding environment
// ============================================================================

/// What the runtime makes available to a bind.
///
/// The storage registry supplies cell factories; the context flag
/// witnesses that an ambient execution context will be present at every
/// invocation. Dispatch layers that always thread a context set it
/// unconditionally.
#[derive(Clone, Copy)]
pub struct BindEnv<'r> {
    storage: &'r StorageRegistry,
    ambient_context: bool,
}

impl<'r> BindEnv<'r> {
    /// An environment with no ambient context.
    pub fn new(storage: &'r StorageRegistry) -> Self {
        BindEnv {
            storage,
            ambient_context: false,
        }
    }

    /// Marks the ambient context as available.
    pub fn with_context(mut self) -> Self {
        self.ambient_context = true;
        self
    }

    /// True if an ambient context will be supplied at invocation time.
    #[inline]
    pub fn has_context(&self) -> bool {
        self.ambient_context
    }

    /// The storage registry binds construct cells from.
    #[inline]
    pub fn storage(&self) -> &'r StorageRegistry {
        self.storage
    }
}

// ============================================================================
// Bound plans
// ============================================================================

/// Product of a successful bind: the argument plan, the storage cells it
/// references, and the shape guard that decides whether a later
/// invocation may reuse it.
#[derive(Debug)]
pub struct BoundArgs {
    exprs: ArgListExpr,
    storage: Box<[Arc<StorageCell>]>,
    shape: ArgShape,
}

impl BoundArgs {
    /// The argument plan, one node per formal parameter.
    #[inline]
    pub fn exprs(&self) -> &ArgListExpr {
        &self.exprs
    }

    /// Storage cells constructed by this bind, indexed by the plan's
    /// `Storage` slots.
    #[inline]
    pub fn storage(&self) -> &[Arc<StorageCell>] {
        &self.storage
    }

    /// The shape guard recorded at bind time.
    #[inline]
    pub fn shape(&self) -> &ArgShape {
        &self.shape
    }

    /// Decomposes the bind product.
    pub fn into_parts(self) -> (ArgListExpr, Box<[Arc<StorageCell>]>, ArgShape) {
        (self.exprs, self.storage, self.shape)
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Binds one candidate signature against an observed argument list.
///
/// On success the returned plan is valid for every future argument list
/// matching the recorded shape. On failure the candidate is rejected; the
/// caller decides whether another candidate gets a try.
pub fn bind(sig: &Signature, args: &[Value], env: &BindEnv<'_>) -> BindResult<BoundArgs> {
    let supplied = args.len();

    // ------------------------------------------------------------------
    // Phase 1: one builder per parameter, storage cells constructed as
    // their parameters are recognized.
    // ------------------------------------------------------------------
    let mut slots: SmallVec<[BuilderSlot; 8]> = SmallVec::with_capacity(sig.len());
    let mut cells: SmallVec<[Arc<StorageCell>; 2]> = SmallVec::new();
    let mut fixed_taken = 0usize;

    for (ordinal, spec) in sig.params().iter().enumerate() {
        let builder = match spec.kind {
            ParamKind::Context => ArgBuilder::Context,
            ParamKind::Storage(ty) => {
                let cell = env
                    .storage
                    .construct(ty)
                    .ok_or(BindError::UnconstructibleStorage {
                        param: spec.name,
                        ty,
                    })?;
                let slot = cells.len() as u16;
                cells.push(Arc::new(cell));
                ArgBuilder::Storage { slot, ty }
            }
            ParamKind::Variadic => ArgBuilder::Variadic,
            ParamKind::Positional => {
                if fixed_taken < supplied {
                    fixed_taken += 1;
                    ArgBuilder::Positional
                } else if let Some(default) = spec.default {
                    ArgBuilder::Defaulted(default)
                } else {
                    // Ran out of arguments with a required parameter left.
                    log::debug!(
                        "[bind] candidate {} rejected: {} args for required '{}'",
                        sig,
                        supplied,
                        spec.name
                    );
                    return Err(BindError::ArityMismatch {
                        expected: sig.arity(),
                        supplied,
                    });
                }
            }
        };
        slots.push(BuilderSlot::new(ordinal as u16, spec.name, builder));
    }

    // ------------------------------------------------------------------
    // Phase 2: priority order. The sort is stable, so builders with equal
    // priority keep their declaration order.
    // ------------------------------------------------------------------
    let mut order: SmallVec<[u16; 8]> = (0..slots.len() as u16).collect();
    order.sort_by_key(|&i| slots[i as usize].priority());

    // ------------------------------------------------------------------
    // Phase 3: partition the argument positions among the consuming
    // builders, front to back.
    // ------------------------------------------------------------------
    let mut consumed: SmallVec<[bool; 16]> = smallvec![false; supplied];
    let mut cursor = 0usize;

    for &i in &order {
        let slot = &mut slots[i as usize];
        match slot.consumption() {
            Consumption::Fixed(0) => {}
            Consumption::Fixed(n) => {
                debug_assert!(cursor + n as usize <= supplied, "claims cannot overrun the pool");
                slot.claim.first = cursor as u16;
                slot.claim.len = n;
                for _ in 0..n {
                    consumed[cursor] = true;
                    cursor += 1;
                }
            }
            Consumption::Remaining => {
                slot.claim.first = cursor as u16;
                slot.claim.len = (supplied - cursor) as u16;
                while cursor < supplied {
                    consumed[cursor] = true;
                    cursor += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Phase 4: every supplied position must have been claimed.
    // ------------------------------------------------------------------
    let claimed = consumed.iter().filter(|&&c| c).count();
    if claimed != supplied {
        log::debug!(
            "[bind] candidate {} rejected: claimed {} of {} args",
            sig,
            claimed,
            supplied
        );
        return Err(BindError::ArityMismatch {
            expected: sig.arity(),
            supplied,
        });
    }

    // ------------------------------------------------------------------
    // Phase 5: emit, reassembling in declaration order. Emission is pure,
    // so walking the slots in declaration order rather than priority
    // order changes nothing observable.
    // ------------------------------------------------------------------
    let mut nodes: Vec<ArgExpr> = Vec::with_capacity(slots.len());
    for slot in &slots {
        // Synthetic builders never consume; the partition phase cannot
        // have claimed positions for them.
        debug_assert!(!(slot.is_synthetic() && slot.claim.len != 0));
        nodes.push(slot.emit(env)?);
    }

    Ok(BoundArgs {
        exprs: ArgListExpr::new(nodes.into_boxed_slice()),
        storage: cells.into_vec().into_boxed_slice(),
        shape: ArgShape::of(args),
    })
}

// ============================================================================
// Tests
// ============================================================================
