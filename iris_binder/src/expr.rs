//! Argument expression trees.
//!
//! A successful bind produces a small algebraic plan describing how to
//! materialize each formal parameter from the call-site arguments. Nodes
//! reference argument *positions*, never argument values, so a plan
//! depends only on the observed shape and can be replayed across
//! invocations.

use iris_core::intern::InternedString;
use iris_core::value::Value;

// ============================================================================
// Nodes
// ============================================================================

/// How one formal parameter obtains its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgExpr {
    /// The caller-supplied argument at this call-site position.
    Arg(u16),
    /// The caller-supplied arguments from `first` onward, collected into
    /// one ordered sequence.
    Rest {
        /// First collected call-site position; may equal the argument
        /// count, yielding an empty tail.
        first: u16,
    },
    /// The ambient execution context, forwarded by the runtime.
    Context,
    /// The per-call-site storage cell at this slot of the bound plan.
    Storage(u16),
    /// A bind-time constant, used for defaulted parameters.
    Const(Value),
}

impl std::fmt::Display for ArgExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgExpr::Arg(i) => write!(f, "arg[{}]", i),
            ArgExpr::Rest { first } => write!(f, "arg[{}..]", first),
            ArgExpr::Context => f.write_str("<context>"),
            ArgExpr::Storage(slot) => write!(f, "<storage:{}>", slot),
            ArgExpr::Const(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// Argument lists
// ============================================================================

/// The ordered argument plan for one candidate: exactly one node per
/// formal parameter, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgListExpr {
    nodes: Box<[ArgExpr]>,
}

impl ArgListExpr {
    /// Wraps a declaration-ordered node list.
    pub fn new(nodes: Box<[ArgExpr]>) -> Self {
        ArgListExpr { nodes }
    }

    /// Nodes in declaration order.
    #[inline]
    pub fn nodes(&self) -> &[ArgExpr] {
        &self.nodes
    }

    /// Node for the parameter at `ordinal`.
    #[inline]
    pub fn node(&self, ordinal: usize) -> Option<&ArgExpr> {
        self.nodes.get(ordinal)
    }

    /// Number of formal parameters covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the plan covers zero parameters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the nodes in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ArgExpr> {
        self.nodes.iter()
    }
}

impl std::fmt::Display for ArgListExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", node)?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// Invocations
// ============================================================================

/// Identifies the overload candidate an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId {
    /// Interned callee name.
    pub name: InternedString,
    /// Index of the candidate within its overload set.
    pub candidate: u16,
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.candidate)
    }
}

/// A native target applied to an assembled argument plan.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeExpr {
    /// The candidate being invoked.
    pub target: TargetId,
    /// The argument plan, one node per formal parameter.
    pub args: ArgListExpr,
}

impl InvokeExpr {
    /// Builds an invocation node.
    pub fn new(target: TargetId, args: ArgListExpr) -> Self {
        InvokeExpr { target, args }
    }
}

impl std::fmt::Display for InvokeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.target, self.args)
    }
}

// ============================================================================
// Tests
// ============================================================================
