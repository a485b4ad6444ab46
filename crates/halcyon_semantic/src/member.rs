//! `Member`: the unifying abstraction of the data model (spec.md §3).
//!
//! "Anything that can stand in an evaluation slot" — a type, an instance, a
//! constant, a variable binding, or the distinguished bottom value
//! `Unknown`. Grounded on the same shape as `red_knot_python_semantic`'s
//! `Symbol`/`Type` split, but collapsed into one sum type because spec.md
//! explicitly specifies it that way (§3: "tagged sum with variants").

use std::sync::Mutex;

use ruff_python_ast::name::Name;

use crate::collaborators::Location;
use crate::scope::ScopeId;
use crate::types::{Constant, Instance, TypeId};

/// Where a [`Variable`]'s current value came from (spec.md §3: "a `source`
/// tag ∈ {declaration, assignment, import, builtin, generic-param}").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum VariableSource {
    /// A `class`/`def` declaration, or an annotation-only statement.
    Declaration,
    /// A plain assignment (`x = ...`, `self.x = ...`).
    Assignment,
    /// An `import`/`from ... import` statement.
    Import,
    /// A name synthesized by this core rather than written by the user
    /// (e.g. `__class__`, or a builtin pulled in for annotation lookup).
    Builtin,
    /// A type-parameter introduced by a generic class/function's type
    /// parameter list.
    GenericParam,
}

/// A name binding inside a scope (spec.md §3, `Variable`).
///
/// Identity is `(scope, name)` rather than a pointer: scopes are arena-owned
/// (see [`crate::scope`]), so a `Variable` is always reached by looking it
/// up in its owning [`crate::scope::Scope`], never held across a mutation by
/// raw reference. The mutable fields below exist because collection can
/// revisit and update a variable (e.g. appending overloads, attaching
/// further reference locations) after its initial declaration.
#[derive(Debug)]
pub struct Variable {
    name: Name,
    value: Mutex<Member>,
    source: VariableSource,
    /// Populated only for user-declared variables (spec.md §4.A): a
    /// function or class freshly created by the collector attaches its
    /// references to the `Type` instead, so `declared_location` stays
    /// `None` for it. An assignment to a plain name attaches here.
    locations: Mutex<Vec<Location>>,
}

impl Variable {
    pub fn new(name: Name, value: Member, source: VariableSource) -> Self {
        Self {
            name,
            value: Mutex::new(value),
            source,
            locations: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn source(&self) -> VariableSource {
        self.source
    }

    pub fn value(&self) -> Member {
        self.value.lock().unwrap().clone()
    }

    pub fn set_value(&self, value: Member) {
        *self.value.lock().unwrap() = value;
    }

    pub fn add_location(&self, location: Location) {
        self.locations.lock().unwrap().push(location);
    }

    pub fn locations(&self) -> Vec<Location> {
        self.locations.lock().unwrap().clone()
    }
}

/// Stable identity of a [`Variable`]: the scope it lives in plus its name.
/// Used as the payload of [`Member::Variable`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VariableRef {
    pub scope: ScopeId,
    pub name: Name,
}

/// The unifying evaluation-slot value (spec.md §3, `Member`).
#[derive(Debug, Clone)]
pub enum Member {
    Type(TypeId),
    Instance(Instance),
    Constant(Constant),
    Variable(VariableRef),
    /// The distinguished bottom value: every operation on it yields it back
    /// (spec.md §3, glossary "Unknown").
    Unknown,
}

impl Member {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Member::Unknown)
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Member::Type(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<Instance> {
        match self {
            Member::Instance(instance) => Some(*instance),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Member::Constant(constant) => Some(constant),
            _ => None,
        }
    }
}

impl Default for Member {
    fn default() -> Self {
        Member::Unknown
    }
}
