//! Runtime error type shared by the binder and dispatch layers.

use std::fmt;

/// Result alias for fallible runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors surfaced to the embedder by an invocation.
///
/// Binding faults that only reject a single candidate stay inside the
/// binder; what escapes here is either a whole-call failure or an error the
/// native target itself raised.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// An argument or operand had a type the target cannot accept.
    TypeError {
        /// Human-readable description.
        message: String,
    },
    /// An argument had the right type but an unacceptable value.
    ValueError {
        /// Human-readable description.
        message: String,
    },
    /// No overload candidate could bind the supplied arguments.
    NoMatchingOverload {
        /// Callee name.
        callee: String,
        /// Number of caller-supplied arguments.
        supplied: usize,
        /// Rejection reported by the last candidate tried.
        reason: String,
    },
    /// Invariant breach inside the runtime itself.
    Internal {
        /// Static description of the breached invariant.
        message: &'static str,
    },
}

impl RuntimeError {
    /// Builds a `TypeError` from anything displayable.
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError {
            message: message.into(),
        }
    }

    /// Builds a `ValueError` from anything displayable.
    pub fn value_error(message: impl Into<String>) -> Self {
        RuntimeError::ValueError {
            message: message.into(),
        }
    }

    /// Builds an `Internal` error from a static description.
    #[cold]
    pub fn internal(message: &'static str) -> Self {
        RuntimeError::Internal { message }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeError { message } => write!(f, "TypeError: {}", message),
            RuntimeError::ValueError { message } => write!(f, "ValueError: {}", message),
            RuntimeError::NoMatchingOverload {
                callee,
                supplied,
                reason,
            } => write!(
                f,
                "no overload of {}() accepts {} argument{} ({})",
                callee,
                supplied,
                if *supplied == 1 { "" } else { "s" },
                reason
            ),
            RuntimeError::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}

// ============================================================================
// Tests
// ============================================================================
