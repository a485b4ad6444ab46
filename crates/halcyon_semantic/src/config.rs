//! Analysis-wide configuration.
//!
//! Grounded on `red_knot_python_semantic::program::{Program, ProgramSettings}`:
//! a small, cheaply-cloned settings struct the host builds once and hands to
//! a session, as opposed to threading a dozen loose booleans through every
//! call.

/// Knobs spec.md leaves as free parameters of the host environment.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether the module under analysis should be treated as library code.
    ///
    /// Drives the function-body-walk skip rule (spec.md §4.F.2.1) and the
    /// locals-clearing behavior (spec.md §4.F.2.6). User-authored modules
    /// (the common editor case) always walk bodies regardless of this flag.
    pub is_library_module: bool,

    /// Whether this module is itself a stub module (`.pyi`-like) — stub
    /// modules never walk function bodies (spec.md §4.F.2.1).
    pub is_stub_module: bool,

    /// Clear a library function's local scope after evaluation once no
    /// inner class or function remains declared in it (spec.md §4.F.2.6).
    /// Defaults to `true`; tests that want to inspect a library function's
    /// locals after the fact should disable it.
    pub clear_library_function_locals: bool,

    /// Recursion-depth guard for the registry drive loop (spec.md §5:
    /// "implementations should guard against pathological depth"). Hit only
    /// by pathologically nested inner definitions; surfaced as
    /// [`crate::InternalError::RecursionLimitExceeded`].
    pub max_nesting_depth: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            is_library_module: false,
            is_stub_module: false,
            clear_library_function_locals: true,
            max_nesting_depth: 256,
        }
    }
}

impl AnalysisOptions {
    pub fn for_library_module() -> Self {
        Self {
            is_library_module: true,
            ..Self::default()
        }
    }

    pub fn for_stub_module() -> Self {
        Self {
            is_library_module: true,
            is_stub_module: true,
            ..Self::default()
        }
    }

    /// Override the nesting-depth guard (spec.md §7). Rejects `0`, which
    /// would prevent the collector from ever descending into even a
    /// top-level class or function body — a host-configuration error this
    /// core can't silently round up from.
    pub fn with_max_nesting_depth(self, depth: usize) -> anyhow::Result<Self> {
        if depth == 0 {
            anyhow::bail!("max_nesting_depth must be at least 1, got 0");
        }
        Ok(Self {
            max_nesting_depth: depth,
            ..self
        })
    }
}
