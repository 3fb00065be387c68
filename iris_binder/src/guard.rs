//! Type guards and shape fingerprints.
//!
//! An [`ArgShape`] records the type tag of every caller-supplied argument
//! at one invocation. Shapes are the cache key of the rebind store and the
//! guard a cached plan re-checks before it trusts itself: same length,
//! same tag at every position.

use iris_core::value::{TypeTag, Value};
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

/// Longest argument list whose fingerprint packs positionally into a
/// single word: 14 nibbles of tags plus a length byte.
pub const PACKED_SHAPE_MAX: usize = 14;

/// Marker byte in the top 8 bits of a fingerprint computed by hashing
/// rather than packing. Packed fingerprints put the length there, and the
/// length never exceeds [`PACKED_SHAPE_MAX`], so the domains are disjoint.
const HASHED_SHAPE_MARKER: u64 = 0xFF;

/// Per-position type guard vector for one observed argument list.
///
/// Equality and hashing are structural, so a shape can key a map directly.
/// Inline storage covers the common small arities without allocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ArgShape {
    tags: SmallVec<[TypeTag; 8]>,
}

impl ArgShape {
    /// Records the shape of an argument list.
    pub fn of(args: &[Value]) -> Self {
        ArgShape {
            tags: args.iter().map(|v| v.type_tag()).collect(),
        }
    }

    /// Builds a shape from explicit tags.
    pub fn from_tags(tags: &[TypeTag]) -> Self {
        ArgShape {
            tags: SmallVec::from_slice(tags),
        }
    }

    /// Number of guarded positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True for the empty argument list.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Guarded tags, one per call-site position.
    #[inline]
    pub fn tags(&self) -> &[TypeTag] {
        &self.tags
    }

    /// Checks the guards against a fresh argument list: same length and
    /// the recorded tag at every position.
    #[inline]
    pub fn matches(&self, args: &[Value]) -> bool {
        self.tags.len() == args.len()
            && self
                .tags
                .iter()
                .zip(args)
                .all(|(tag, arg)| *tag == arg.type_tag())
    }

    /// Compact one-word fingerprint of the shape.
    ///
    /// Shapes up to [`PACKED_SHAPE_MAX`] positions pack injectively: the
    /// length in the top byte, then one nibble per tag from bit 0 upward.
    /// Longer shapes fall back to a hash fold with the top byte forced to
    /// the hashed-domain marker. Equal shapes always produce equal
    /// fingerprints; packed fingerprints are additionally collision-free.
    pub fn packed(&self) -> u64 {
        if self.tags.len() <= PACKED_SHAPE_MAX {
            let mut word = (self.tags.len() as u64) << 56;
            for (i, tag) in self.tags.iter().enumerate() {
                word |= (tag.nibble() as u64) << (4 * i);
            }
            word
        } else {
            let mut hasher = FxHasher::default();
            self.tags.hash(&mut hasher);
            (hasher.finish() & !(0xFFu64 << 56)) | (HASHED_SHAPE_MARKER << 56)
        }
    }
}

impl std::fmt::Display for ArgShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(tag.name())?;
        }
        f.write_str("]")
    }
}

// ============================================================================
// Tests
// ============================================================================
