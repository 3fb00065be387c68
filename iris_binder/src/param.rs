//! Formal parameter descriptors and validated signatures.
//!
//! A [`Signature`] is the binder's view of one overload candidate: an
//! ordered list of [`ParamSpec`]s, checked once at construction so that
//! binding never has to re-validate shape rules. Ordinals are positions in
//! the declaration list; they are not stored, they are the index.

use iris_core::intern::{intern, InternedString};
use iris_core::value::{TypeTag, Value};

use crate::error::SignatureError;
use crate::storage::StorageTypeId;

// ============================================================================
// Parameter kinds
// ============================================================================

/// What supplies a parameter's value at invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// One caller-supplied positional argument.
    Positional,
    /// The remaining caller-supplied arguments, collected in order.
    Variadic,
    /// The ambient execution context, injected by the runtime.
    Context,
    /// A per-call-site storage cell of the given type, injected by the
    /// runtime.
    Storage(StorageTypeId),
}

impl ParamKind {
    /// Synthetic parameters are filled by the runtime; callers never see
    /// them and never supply values for them.
    #[inline]
    pub fn is_synthetic(self) -> bool {
        matches!(self, ParamKind::Context | ParamKind::Storage(_))
    }

    /// True if this kind consumes caller-supplied positions.
    #[inline]
    pub fn consumes_arguments(self) -> bool {
        matches!(self, ParamKind::Positional | ParamKind::Variadic)
    }
}

// ============================================================================
// Parameter descriptors
// ============================================================================

/// One formal parameter of an overload candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, for diagnostics.
    pub name: InternedString,
    /// How the parameter is supplied.
    pub kind: ParamKind,
    /// Declared type, `None` accepting any runtime type. Carried for
    /// diagnostics; guards key on observed argument types, not this.
    pub declared: Option<TypeTag>,
    /// Default value, making the parameter optional. Only meaningful on
    /// `Positional` parameters.
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required positional parameter accepting any type.
    pub fn positional(name: &str) -> Self {
        ParamSpec {
            name: intern(name),
            kind: ParamKind::Positional,
            declared: None,
            default: None,
        }
    }

    /// A variadic tail parameter collecting the remaining arguments.
    pub fn variadic(name: &str) -> Self {
        ParamSpec {
            name: intern(name),
            kind: ParamKind::Variadic,
            declared: None,
            default: None,
        }
    }

    /// A synthetic context parameter. Must precede every caller-supplied
    /// parameter in the signature.
    pub fn context(name: &str) -> Self {
        ParamSpec {
            name: intern(name),
            kind: ParamKind::Context,
            declared: None,
            default: None,
        }
    }

    /// A synthetic storage parameter of the given registered type.
    pub fn storage(name: &str, ty: StorageTypeId) -> Self {
        ParamSpec {
            name: intern(name),
            kind: ParamKind::Storage(ty),
            declared: None,
            default: None,
        }
    }

    /// Annotates the declared type.
    pub fn typed(mut self, tag: TypeTag) -> Self {
        self.declared = Some(tag);
        self
    }

    /// Attaches a default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Shorthand for [`ParamKind::is_synthetic`].
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.kind.is_synthetic()
    }
}

impl std::fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParamKind::Positional => {
                write!(f, "{}", self.name)?;
                if let Some(tag) = self.declared {
                    write!(f, ": {}", tag)?;
                }
                if let Some(default) = self.default {
                    write!(f, " = {}", default)?;
                }
                Ok(())
            }
            ParamKind::Variadic => write!(f, "*{}", self.name),
            ParamKind::Context => write!(f, "{}: <context>", self.name),
            ParamKind::Storage(ty) => write!(f, "{}: <{}>", self.name, ty),
        }
    }
}

// ============================================================================
// Arity
// ============================================================================

/// Caller-supplied argument counts a signature can absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArityRange {
    /// Minimum number of caller-supplied arguments.
    pub min: u16,
    /// Maximum number, `None` meaning unbounded (variadic tail).
    pub max: Option<u16>,
}

impl ArityRange {
    /// True if `supplied` arguments fall inside the range.
    #[inline]
    pub fn contains(self, supplied: usize) -> bool {
        supplied >= self.min as usize
            && self.max.map_or(true, |max| supplied <= max as usize)
    }
}

impl std::fmt::Display for ArityRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            None => write!(f, "at least {}", self.min),
            Some(max) if max == self.min => write!(f, "exactly {}", self.min),
            Some(max) => write!(f, "between {} and {}", self.min, max),
        }
    }
}

// ============================================================================
// Signatures
// ============================================================================

/// A validated, ordered parameter list.
///
/// Construction enforces the shape rules once:
///
/// - at most one variadic parameter, and no positional parameter after it;
/// - context parameters precede every caller-supplied parameter;
/// - defaulted positional parameters form a suffix of the fixed ones;
/// - defaults only appear on positional parameters.
///
/// Storage parameters may appear anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    params: Box<[ParamSpec]>,
    fixed: u16,
    required: u16,
    variadic: bool,
}

impl Signature {
    /// Validates and builds a signature from its parameter list.
    pub fn new(params: Vec<ParamSpec>) -> Result<Self, SignatureError> {
        let mut seen_caller_supplied = false;
        let mut seen_variadic = false;
        let mut seen_default = false;
        let mut fixed = 0u16;
        let mut required = 0u16;

        for spec in &params {
            match spec.kind {
                ParamKind::Context => {
                    if seen_caller_supplied {
                        return Err(SignatureError::ContextAfterPositional { param: spec.name });
                    }
                    if spec.default.is_some() {
                        return Err(SignatureError::DefaultNotAllowed { param: spec.name });
                    }
                }
                ParamKind::Storage(_) => {
                    if spec.default.is_some() {
                        return Err(SignatureError::DefaultNotAllowed { param: spec.name });
                    }
                }
                ParamKind::Variadic => {
                    if seen_variadic {
                        return Err(SignatureError::SecondVariadic { param: spec.name });
                    }
                    if spec.default.is_some() {
                        return Err(SignatureError::DefaultNotAllowed { param: spec.name });
                    }
                    seen_variadic = true;
                    seen_caller_supplied = true;
                }
                ParamKind::Positional => {
                    if seen_variadic {
                        return Err(SignatureError::PositionalAfterVariadic { param: spec.name });
                    }
                    if spec.default.is_some() {
                        seen_default = true;
                    } else {
                        if seen_default {
                            return Err(SignatureError::NonSuffixDefault { param: spec.name });
                        }
                        required += 1;
                    }
                    fixed += 1;
                    seen_caller_supplied = true;
                }
            }
        }

        Ok(Signature {
            params: params.into_boxed_slice(),
            fixed,
            required,
            variadic: seen_variadic,
        })
    }

    /// The parameter list, in declaration order. Ordinal == index.
    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Parameter at `ordinal`, if in range.
    #[inline]
    pub fn param(&self, ordinal: usize) -> Option<&ParamSpec> {
        self.params.get(ordinal)
    }

    /// Total parameter count, synthetic included.
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True if the signature declares no parameters at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of fixed (non-variadic) caller-supplied parameters.
    #[inline]
    pub fn fixed_count(&self) -> u16 {
        self.fixed
    }

    /// Number of fixed parameters with no default.
    #[inline]
    pub fn required_count(&self) -> u16 {
        self.required
    }

    /// True if the signature ends in a variadic tail.
    #[inline]
    pub fn has_variadic(&self) -> bool {
        self.variadic
    }

    /// Number of synthetic (runtime-injected) parameters.
    pub fn synthetic_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_synthetic()).count()
    }

    /// Caller-supplied argument counts this signature can bind.
    #[inline]
    pub fn arity(&self) -> ArityRange {
        ArityRange {
            min: self.required,
            max: if self.variadic { None } else { Some(self.fixed) },
        }
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (i, spec) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", spec)?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// Tests
// ============================================================================
