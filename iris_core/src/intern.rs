//! Global string interning.
//!
//! Parameter names, callee names, and storage type names are interned once
//! and handled as 4-byte ids afterwards. Interned text is leaked into the
//! process; the pool only ever grows, so handles stay valid for the life of
//! the program.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Handle to an interned string.
///
/// Comparison and hashing operate on the id alone. Two handles are equal
/// if and only if their text is equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InternedString(u32);

impl InternedString {
    /// Returns the interned text.
    #[inline]
    pub fn as_str(self) -> &'static str {
        with_pool(|pool| pool.entries[self.0 as usize])
    }

    /// Raw pool index, stable for the life of the process.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for InternedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for InternedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interns `text`, returning its stable handle.
///
/// Idempotent: interning the same text twice yields the same handle.
pub fn intern(text: &str) -> InternedString {
    // Fast path: already interned.
    if let Some(id) = pool().read().ids.get(text) {
        return InternedString(*id);
    }
    let mut inner = pool().write();
    // Re-check under the write lock; another thread may have won the race.
    if let Some(id) = inner.ids.get(text) {
        return InternedString(*id);
    }
    let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
    let id = inner.entries.len() as u32;
    inner.entries.push(leaked);
    inner.ids.insert(leaked, id);
    InternedString(id)
}

/// Number of distinct strings interned so far.
pub fn interned_count() -> usize {
    pool().read().entries.len()
}

#[derive(Default)]
struct Pool {
    ids: FxHashMap<&'static str, u32>,
    entries: Vec<&'static str>,
}

fn pool() -> &'static RwLock<Pool> {
    static POOL: OnceLock<RwLock<Pool>> = OnceLock::new();
    POOL.get_or_init(|| RwLock::new(Pool::default()))
}

fn with_pool<R>(f: impl FnOnce(&Pool) -> R) -> R {
    f(&pool().read())
}

// ============================================================================
// Tests
// ============================================================================
