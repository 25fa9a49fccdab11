//! Tunable limits and defaults shared by the path resolver and (via the
//! `jsonspan-reflect` crate) the materializer.

/// Behavioral knobs for key-path resolution and coercion.
///
/// The teacher crate collapsed its `scan`/`scan_json` duplicate entry
/// points into a single configurable one; this type plays the same role
/// here — every public operation has a `_with_config` sibling that takes
/// one of these instead of assuming defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of dotted components a key path may contain.
    /// Exceeding this raises `Error::PathTooDeep`. Guards against
    /// adversarially long path strings driving unbounded descent.
    pub max_path_components: usize,

    /// When `true`, coercions only succeed along each type's native
    /// `Kind` (no number-from-string, no bool-from-number, and so on).
    pub strict: bool,

    /// Maximum nesting depth the reflective materializer will recurse
    /// through before raising `RecursionTooDeep`. Unused by this crate
    /// directly (the path resolver is iterative, not recursive); carried
    /// here so `jsonspan-reflect` can thread one `Config` through both
    /// layers. Mirrors the teacher's `U8Pool` nesting-depth guard.
    pub max_recursion_depth: usize,
}

impl Config {
    /// 64 path components, permissive coercion — the defaults documented
    /// in the data model.
    pub const DEFAULT_MAX_PATH_COMPONENTS: usize = 64;

    /// Default maximum materialization recursion depth.
    pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 128;

    #[must_use]
    pub fn permissive() -> Self {
        Config {
            max_path_components: Self::DEFAULT_MAX_PATH_COMPONENTS,
            strict: false,
            max_recursion_depth: Self::DEFAULT_MAX_RECURSION_DEPTH,
        }
    }

    #[must_use]
    pub fn strict() -> Self {
        Config {
            strict: true,
            ..Self::permissive()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::permissive()
    }
}
