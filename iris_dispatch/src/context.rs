//! The ambient execution context.

use iris_core::intern::{intern, InternedString};
use iris_core::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Runtime-owned execution context threaded into every invocation.
///
/// Callees reach it through a synthetic context parameter; callers never
/// pass one and the dispatch layer never hands out a null. Anything a
/// target needs beyond its arguments (globals, interned configuration)
/// hangs off this.
#[derive(Default)]
pub struct EvalContext {
    globals: RwLock<FxHashMap<InternedString, Value>>,
}

impl EvalContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a global binding, replacing any previous value.
    pub fn set_global(&self, name: &str, value: impl Into<Value>) {
        self.globals.write().insert(intern(name), value.into());
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.read().get(&intern(name)).copied()
    }

    /// Number of global bindings.
    pub fn global_count(&self) -> usize {
        self.globals.read().len()
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("globals", &self.global_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
