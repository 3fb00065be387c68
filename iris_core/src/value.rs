//! Dynamic value representation and runtime type tags.
//!
//! `Value` is the compact, copyable form every caller-supplied argument
//! takes on its way through binding and invocation. The binder never looks
//! past the type tag; payloads only matter to the native target that
//! finally receives them.

use crate::intern::InternedString;

// ============================================================================
// Value
// ============================================================================

/// A dynamic runtime value.
///
/// Kept `Copy` so argument slices can be partitioned, sliced, and forwarded
/// without reference counting on the invocation path. Strings are interned
/// handles, not owned buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// The absent value.
    None,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// IEEE 754 double.
    Float(f64),
    /// Interned string handle.
    Str(InternedString),
}

impl Value {
    /// Runtime type tag of this value.
    #[inline(always)]
    pub fn type_tag(self) -> TypeTag {
        TypeTag::of(self)
    }

    /// True for `Value::None`.
    #[inline]
    pub fn is_none(self) -> bool {
        matches!(self, Value::None)
    }

    /// Integer payload, if this is an `Int`.
    #[inline]
    pub fn as_int(self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Float payload, if this is a `Float`.
    #[inline]
    pub fn as_float(self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Boolean payload, if this is a `Bool`.
    #[inline]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// String payload, if this is a `Str`.
    #[inline]
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<InternedString> for Value {
    #[inline]
    fn from(s: InternedString) -> Self {
        Value::Str(s)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s.as_str()),
        }
    }
}

// ============================================================================
// Type tags
// ============================================================================

/// Runtime type tag, the unit of call-site type guards.
///
/// Discriminants start at 1 so that 0 stays free as the empty-slot
/// sentinel in packed shape fingerprints. Every tag fits in a nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    /// `Value::None`.
    None = 1,
    /// `Value::Bool`.
    Bool = 2,
    /// `Value::Int`.
    Int = 3,
    /// `Value::Float`.
    Float = 4,
    /// `Value::Str`.
    Str = 5,
}

impl TypeTag {
    /// Tag of a concrete value.
    #[inline(always)]
    pub fn of(value: Value) -> Self {
        match value {
            Value::None => TypeTag::None,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
        }
    }

    /// Tag as a 4-bit code for fingerprint packing. Never 0.
    #[inline(always)]
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Human-readable type name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::None => "NoneType",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Tests
// ============================================================================
