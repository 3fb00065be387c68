//! Call-site configuration.

/// Default cap on cached shapes per site.
pub const DEFAULT_SHAPE_LIMIT: usize = 8;

/// Tuning knobs for one call site.
///
/// The defaults suit ordinary sites; tests and unusual embeddings shrink
/// the shape limit to force megamorphic behavior early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteConfig {
    /// Maximum number of shapes cached before the site goes megamorphic
    /// and serves further shapes with transient, uncached binds.
    ///
    /// Default: [`DEFAULT_SHAPE_LIMIT`].
    pub shape_limit: usize,

    /// Keep the most recent entry in a monomorphic fast slot checked
    /// before the shape table.
    ///
    /// Default: `true`.
    pub fast_path: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            shape_limit: DEFAULT_SHAPE_LIMIT,
            fast_path: true,
        }
    }
}

impl SiteConfig {
    /// Configuration with a custom shape cap.
    pub fn with_shape_limit(limit: usize) -> Self {
        SiteConfig {
            shape_limit: limit,
            ..Self::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
