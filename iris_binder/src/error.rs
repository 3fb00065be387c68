//! Binder error taxonomy.
//!
//! Signature shape problems are caught at construction
//! ([`SignatureError`]); per-candidate binding failures are reported as
//! [`BindError`] and normally cause the resolver to try the next
//! candidate. A stale type guard is deliberately absent here: a guard miss
//! is a cache signal that triggers rebinding, never an error.

use std::fmt;

use iris_core::intern::InternedString;

use crate::param::ArityRange;
use crate::storage::StorageTypeId;

/// Result alias for binder operations.
pub type BindResult<T> = Result<T, BindError>;

// ============================================================================
// Signature construction errors
// ============================================================================

/// A parameter list that violates the signature shape rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// More than one variadic parameter.
    SecondVariadic {
        /// Name of the offending parameter.
        param: InternedString,
    },
    /// A positional parameter declared after the variadic tail.
    PositionalAfterVariadic {
        /// Name of the offending parameter.
        param: InternedString,
    },
    /// A context parameter declared after a caller-supplied one.
    ContextAfterPositional {
        /// Name of the offending parameter.
        param: InternedString,
    },
    /// A required positional parameter following a defaulted one.
    NonSuffixDefault {
        /// Name of the offending parameter.
        param: InternedString,
    },
    /// A default value on a parameter kind that cannot carry one.
    DefaultNotAllowed {
        /// Name of the offending parameter.
        param: InternedString,
    },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::SecondVariadic { param } => {
                write!(f, "parameter '{}': only one variadic parameter is allowed", param)
            }
            SignatureError::PositionalAfterVariadic { param } => {
                write!(
                    f,
                    "parameter '{}': positional parameters cannot follow the variadic tail",
                    param
                )
            }
            SignatureError::ContextAfterPositional { param } => {
                write!(
                    f,
                    "parameter '{}': context parameters must precede caller-supplied parameters",
                    param
                )
            }
            SignatureError::NonSuffixDefault { param } => {
                write!(
                    f,
                    "parameter '{}': required parameter follows a defaulted one",
                    param
                )
            }
            SignatureError::DefaultNotAllowed { param } => {
                write!(
                    f,
                    "parameter '{}': only positional parameters may carry defaults",
                    param
                )
            }
        }
    }
}

impl std::error::Error for SignatureError {}

// ============================================================================
// Binding errors
// ============================================================================

/// Why one candidate rejected an argument list at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The supplied argument count can never satisfy the candidate.
    ArityMismatch {
        /// Counts the candidate accepts.
        expected: ArityRange,
        /// Count actually supplied.
        supplied: usize,
    },
    /// A storage parameter's declared type has no registered factory.
    UnconstructibleStorage {
        /// Name of the storage parameter.
        param: InternedString,
        /// The unregistered storage type.
        ty: StorageTypeId,
    },
    /// A context parameter was declared but no ambient context is
    /// available in the binding environment.
    MissingContext {
        /// Name of the context parameter.
        param: InternedString,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::ArityMismatch { expected, supplied } => {
                // Pluralize on the last numeral the range mentions.
                let last = expected.max.unwrap_or(expected.min);
                write!(
                    f,
                    "takes {} argument{} but {} {} given",
                    expected,
                    if last == 1 { "" } else { "s" },
                    supplied,
                    if *supplied == 1 { "was" } else { "were" }
                )
            }
            BindError::UnconstructibleStorage { param, ty } => {
                write!(
                    f,
                    "storage parameter '{}' has unconstructible type {}",
                    param, ty
                )
            }
            BindError::MissingContext { param } => {
                write!(
                    f,
                    "context parameter '{}' bound without an ambient context",
                    param
                )
            }
        }
    }
}

impl std::error::Error for BindError {}

// ============================================================================
// Tests
// ============================================================================
