//! Argument builders.
//!
//! Each formal parameter gets exactly one builder. A builder declares how
//! many caller-supplied positions it consumes and, once the assembler has
//! assigned it a claim, emits the expression node that materializes its
//! parameter. The set of builders is closed: binding behavior is a fixed
//! vocabulary, not an open extension point, so the assembler can reason
//! about every variant it will ever meet.
//!
//! Builders are pure. They never touch argument values and never mutate
//! binding state; claims are handed to them by the assembler.

use iris_core::intern::InternedString;
use iris_core::value::Value;

use crate::assemble::BindEnv;
use crate::error::{BindError, BindResult};
use crate::expr::ArgExpr;
use crate::storage::StorageTypeId;

/// Priority shared by every synthetic builder.
///
/// Caller-consuming builders use their ordinal as priority, so synthetic
/// builders order strictly before all of them and resolve first.
pub const SYNTHETIC_PRIORITY: i32 = -1;

// ============================================================================
// Consumption
// ============================================================================

/// How many caller-supplied positions a builder claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    /// Exactly this many positions, taken from the front of the unclaimed
    /// pool. Synthetic and defaulted builders declare `Fixed(0)`.
    Fixed(u16),
    /// Every position still unclaimed once the fixed claims are done.
    Remaining,
}

// ============================================================================
// Builders
// ============================================================================

/// One argument builder, bound to a single formal parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgBuilder {
    /// Forwards one caller-supplied argument.
    Positional,
    /// Emits the parameter's default; consumes nothing.
    Defaulted(Value),
    /// Collects every remaining caller-supplied argument.
    Variadic,
    /// Injects the ambient execution context; consumes nothing.
    Context,
    /// Injects the per-call-site storage cell constructed for this bind;
    /// consumes nothing.
    Storage {
        /// Slot of the constructed cell in the bound plan's storage list.
        slot: u16,
        /// Declared storage type, kept for diagnostics.
        ty: StorageTypeId,
    },
}

impl ArgBuilder {
    /// Positions this builder claims from the caller-supplied pool.
    #[inline]
    pub fn consumption(&self) -> Consumption {
        match self {
            ArgBuilder::Positional => Consumption::Fixed(1),
            ArgBuilder::Variadic => Consumption::Remaining,
            ArgBuilder::Defaulted(_) | ArgBuilder::Context | ArgBuilder::Storage { .. } => {
                Consumption::Fixed(0)
            }
        }
    }

    /// True for runtime-injected builders. Note that a defaulted builder
    /// consumes nothing yet is not synthetic: its value stands in for a
    /// caller-supplied one.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, ArgBuilder::Context | ArgBuilder::Storage { .. })
    }
}

// ============================================================================
// Slots
// ============================================================================

/// Claimed range of call-site positions. Empty until the assembler
/// partitions the argument pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Claim {
    /// First claimed position.
    pub first: u16,
    /// Number of claimed positions.
    pub len: u16,
}

/// A builder attached to its formal parameter.
#[derive(Debug, Clone, Copy)]
pub struct BuilderSlot {
    /// Declaration position of the parameter this builder fills.
    pub ordinal: u16,
    /// Parameter name, for diagnostics.
    pub param: InternedString,
    /// The builder itself.
    pub builder: ArgBuilder,
    /// Positions assigned during partitioning.
    pub claim: Claim,
}

impl BuilderSlot {
    /// Creates an unclaimed slot.
    pub fn new(ordinal: u16, param: InternedString, builder: ArgBuilder) -> Self {
        BuilderSlot {
            ordinal,
            param,
            builder,
            claim: Claim::default(),
        }
    }

    /// Resolution priority: synthetic builders share [`SYNTHETIC_PRIORITY`],
    /// everything else uses its ordinal. Ties keep declaration order under
    /// the assembler's stable sort.
    #[inline]
    pub fn priority(&self) -> i32 {
        if self.builder.is_synthetic() {
            SYNTHETIC_PRIORITY
        } else {
            self.ordinal as i32
        }
    }

    /// Shorthand for the builder's consumption.
    #[inline]
    pub fn consumption(&self) -> Consumption {
        self.builder.consumption()
    }

    /// Shorthand for the builder's synthetic flag.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.builder.is_synthetic()
    }

    /// Emits the expression node for this parameter.
    ///
    /// Claims already encode call-site positions, so emission never reads
    /// argument values; the only environment a builder consults is the
    /// ambient-context witness.
    pub fn emit(&self, env: &BindEnv<'_>) -> BindResult<ArgExpr> {
        match self.builder {
            ArgBuilder::Positional => {
                debug_assert_eq!(self.claim.len, 1, "positional builders claim one position");
                Ok(ArgExpr::Arg(self.claim.first))
            }
            ArgBuilder::Defaulted(value) => Ok(ArgExpr::Const(value)),
            ArgBuilder::Variadic => Ok(ArgExpr::Rest {
                first: self.claim.first,
            }),
            ArgBuilder::Context => {
                if env.has_context() {
                    Ok(ArgExpr::Context)
                } else {
                    Err(BindError::MissingContext { param: self.param })
                }
            }
            ArgBuilder::Storage { slot, .. } => Ok(ArgExpr::Storage(slot)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
