//! External collaborators this crate consumes but does not implement.
//!
//! Spec.md §1 and §6 name five things as out-of-scope, "specified only by
//! the interfaces they expose": the parser, module resolution, stub lookup,
//! the diagnostics sink and host platform info. This module is those
//! interfaces. A host application implements them (typically backed by a
//! real parser, a real file-system module resolver, a real typeshed-style
//! stub index and a real editor-protocol diagnostics channel); this crate
//! only ever calls through the trait objects.

use ruff_python_ast as ast;
use ruff_text_size::TextRange;

use crate::diagnostics::Diagnostic;
use crate::member::Member;
use crate::python_version::PythonVersion;
use crate::types::Overload;

/// Produces the syntax tree this crate walks. Out of scope: consumed as
/// input only, via [`ast::ModModule`] handed to [`crate::ModuleSession::new`].
pub trait Parser {
    fn parse(&self, source: &str) -> ast::ModModule;
}

/// Opaque handle to a resolved module, returned by [`ModuleResolver`].
///
/// The core never inspects a handle's contents; it only threads it back
/// through to the resolver (e.g. to ask the stub provider for a member of
/// the resolved module) and uses it as a stable identity for a `Type`'s
/// declaring module.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ModuleHandle(pub u32);

/// Given a dotted module name, resolves to the module that provides it.
///
/// Whole-program import resolution (path search, namespace packages,
/// `__init__.py` discovery) lives entirely on the other side of this trait;
/// spec.md's Non-goals exclude it from this core's own responsibilities.
pub trait ModuleResolver {
    /// Resolve `dotted_name` (e.g. `"os.path"`) to a module handle, or
    /// `None` if nothing provides it. May block the calling analysis task
    /// (spec.md §5, "Suspension points").
    fn import(&self, dotted_name: &str) -> Option<ModuleHandle>;

    /// The finite set of dotted names importable from the current module's
    /// resolution context. `include_implicit` controls whether implicit
    /// namespace packages are included.
    fn importable_modules_by_name(&self, name: &str, include_implicit: bool) -> Vec<String>;

    /// Recover a dotted module name from a resolved handle's backing path.
    fn module_name_by_path(&self, handle: ModuleHandle) -> Option<String>;
}

/// Given a dotted attribute chain rooted at a module, returns the
/// stub-declared member at that path, if the module has an associated stub.
///
/// Used exclusively by the stub-override rule (spec.md §4.D.2) and the
/// "stub or specialized module" check in the function evaluator (spec.md
/// §4.F.2.1).
pub trait StubProvider {
    fn lookup(&self, module: ModuleHandle, dotted_path: &[&str]) -> Option<Member>;

    /// Whether `module` has any associated stub at all (as opposed to one
    /// that simply doesn't declare the path being looked up).
    fn has_stub(&self, module: ModuleHandle) -> bool;

    /// The stub-override rule (spec.md §4.D.2): if the stub associated with
    /// the module currently under analysis declares a function at
    /// `dotted_path` with exactly `positional_arity` positional parameters,
    /// return its overload so the function evaluator can take it wholesale
    /// (keeping only the source's docstring). `None` means either there is
    /// no such stub declaration, or the host has no stub for this module at
    /// all.
    fn own_stub_overload(&self, dotted_path: &[&str], positional_arity: usize) -> Option<Overload>;
}

/// Receives structured diagnostics emitted during collection or evaluation.
///
/// Reporting is fire-and-forget from the core's perspective: nothing here
/// observes whether the sink persists, displays, or discards an entry.
pub trait DiagnosticsSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// A [`DiagnosticsSink`] that discards everything, for callers (and tests)
/// that don't care about diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnosticsSink;

impl DiagnosticsSink for NullDiagnosticsSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// A [`DiagnosticsSink`] that just accumulates entries, for tests.
#[derive(Debug, Default)]
pub struct CollectingDiagnosticsSink(pub Vec<Diagnostic>);

impl DiagnosticsSink for CollectingDiagnosticsSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }
}

/// Host platform/version info used to prune `if`-branches guarded by system
/// predicates (spec.md §4.D.3) and to decide default return typing.
pub trait HostInfo {
    fn language_version(&self) -> PythonVersion;
    fn is_windows(&self) -> bool;
    fn is_little_endian(&self) -> bool;

    /// `sys.platform`'s string value for this host (`"linux"`, `"win32"`,
    /// `"darwin"`, ...), used by the same predicate-pruning logic.
    fn platform_name(&self) -> &str {
        if self.is_windows() {
            "win32"
        } else {
            "linux"
        }
    }
}

/// A fixed [`HostInfo`] for embedding and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticHostInfo {
    pub language_version: PythonVersion,
    pub is_windows: bool,
    pub is_little_endian: bool,
}

impl Default for StaticHostInfo {
    fn default() -> Self {
        Self {
            language_version: PythonVersion::default(),
            is_windows: false,
            is_little_endian: true,
        }
    }
}

impl HostInfo for StaticHostInfo {
    fn language_version(&self) -> PythonVersion {
        self.language_version
    }

    fn is_windows(&self) -> bool {
        self.is_windows
    }

    fn is_little_endian(&self) -> bool {
        self.is_little_endian
    }
}

/// A no-op resolver/stub provider pair for modules analysed standalone
/// (no import resolution available). Every import is absorbed to `Unknown`
/// per spec.md §7's "Unresolved reference" policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopModuleResolver;

impl ModuleResolver for NoopModuleResolver {
    fn import(&self, _dotted_name: &str) -> Option<ModuleHandle> {
        None
    }

    fn importable_modules_by_name(&self, _name: &str, _include_implicit: bool) -> Vec<String> {
        Vec::new()
    }

    fn module_name_by_path(&self, _handle: ModuleHandle) -> Option<String> {
        None
    }
}

impl StubProvider for NoopModuleResolver {
    fn lookup(&self, _module: ModuleHandle, _dotted_path: &[&str]) -> Option<Member> {
        None
    }

    fn has_stub(&self, _module: ModuleHandle) -> bool {
        false
    }

    fn own_stub_overload(&self, _dotted_path: &[&str], _positional_arity: usize) -> Option<Overload> {
        None
    }
}

/// A location record in the line/column space of the original source
/// (spec.md §6, "Location records").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Location {
    pub range: TextRange,
}

impl Location {
    pub fn new(range: TextRange) -> Self {
        Self { range }
    }
}
