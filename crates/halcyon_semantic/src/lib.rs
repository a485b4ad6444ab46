//! Module symbol table and lazy type-evaluation engine.
//!
//! Given the parsed tree of a single source module (produced by an external
//! [`Parser`](collaborators::Parser)) and a handful of read-mostly
//! collaborators (module resolution, stub lookup, diagnostics, host info),
//! this crate discovers every class, function, property, overload and
//! module-level variable in the module, establishes their declaring scope,
//! and lazily resolves the type information each one exposes.
//!
//! The entry point is [`ModuleSession`]: it drives collection and evaluation
//! over a single module and exposes the resulting scope tree, member map and
//! diagnostics to downstream consumers (hover, completion, diagnostics,
//! go-to-definition), none of which live in this crate.

pub mod collaborators;
pub mod collector;
pub mod config;
pub mod diagnostics;
pub mod evaluator;
pub mod member;
pub mod member_evaluators;
pub mod node_key;
pub mod python_version;
pub mod registry;
pub mod scope;
pub mod session;
pub mod types;

pub use collaborators::{DiagnosticsSink, HostInfo, ModuleHandle, ModuleResolver, StubProvider};
pub use config::AnalysisOptions;
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use member::{Member, Variable, VariableRef, VariableSource};
pub use python_version::PythonVersion;
pub use scope::{LookupOptions, Scope, ScopeArena, ScopeGuard, ScopeId, ScopeKind};
pub use session::ModuleSession;
pub use types::{ClassType, FunctionType, Instance, Overload, Parameter, ParameterKind, PropertyType, Type, TypeId};

/// Internal invariant failures that abort a single module's analysis.
///
/// Per spec.md §7, these are fatal but scoped: the surrounding session
/// surfaces one synthetic diagnostic and leaves already-computed members
/// visible, rather than propagating a panic out of the crate.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("evaluator registry is in an inconsistent state: {0}")]
    RegistryInconsistent(&'static str),
    #[error("recursion depth exceeded {limit} while evaluating nested definitions")]
    RecursionLimitExceeded { limit: usize },
}
