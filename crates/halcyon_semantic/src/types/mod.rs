//! The `Type` side of the [`Member`](crate::member::Member) data model
//! (spec.md §3).
//!
//! Grounded on `red_knot_python_semantic::types` (`Type<'db>`), but without
//! that crate's gradual-typing lattice (unions, intersections, generic
//! instantiation) — spec.md's Non-goals rule out "exhaustive generic
//! instantiation", so a `Type` here is just the five declared-entity kinds
//! plus the synthetic builtins, exactly what §3 describes.

mod class;
mod function;
mod property;

pub use class::ClassType;
pub use function::{Overload, Parameter, ParameterKind};
pub use property::PropertyType;

use std::fmt;
use std::sync::Mutex;

use itertools::Itertools as _;
use ruff_python_ast::name::Name;

use crate::collaborators::{Location, ModuleHandle};

/// Arena index into a [`crate::session::ModuleSession`]'s type table.
///
/// Spec.md's "Design Notes" call for an arena + index representation so
/// that class-base and scope-parent back-references, which otherwise read
/// as cycles, are plain integers instead of `Rc`/`Weak` pairs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Where a `Type` is declared. Builtins use a synthetic module (spec.md §3,
/// invariant 2: "Builtins use a synthetic module").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DeclaringModule {
    /// Declared in the module currently being analysed.
    Current,
    /// Declared in a different, already-resolved module.
    External(ModuleHandle),
    /// A synthetic builtin with no backing source module.
    Builtin,
}

/// Kind tag exposed by the symbol model's public accessor (spec.md §4.A).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MemberTypeTag {
    Class,
    Function,
    Property,
    Module,
    BuiltinValue,
}

/// One declared entity: a class, function, property, module, or synthetic
/// builtin (spec.md §3, `Type`).
pub struct Type {
    id: TypeId,
    name: Name,
    declaring_module: DeclaringModule,
    /// Dotted path from the module root to this type, e.g. `["Outer",
    /// "method", "Inner"]` for a class nested three levels deep. Used to
    /// build the stable qualified name spec.md §6 promises (see
    /// SPEC_FULL.md §10.E).
    qualified_path: Vec<Name>,
    documentation: Mutex<Option<String>>,
    locations: Mutex<Vec<Location>>,
    kind: TypeKind,
}

pub enum TypeKind {
    Class(ClassType),
    Function(FunctionType),
    Property(PropertyType),
    Module(ModuleType),
    /// A builtin type id with no further structure tracked by this core
    /// (e.g. `int`, `str`, `bool`) — used as the payload of a [`Constant`].
    Builtin(BuiltinTypeId),
}

/// One function or method symbol: a name, an optional declaring class, and
/// an append-only list of overloads (spec.md §3, `Function type`).
pub struct FunctionType {
    pub declaring_type: Option<TypeId>,
    pub is_static: bool,
    pub is_class_method: bool,
    pub is_lambda: bool,
    overloads: Mutex<Vec<Overload>>,
}

impl FunctionType {
    pub fn new(declaring_type: Option<TypeId>) -> Self {
        Self {
            declaring_type,
            is_static: false,
            is_class_method: false,
            is_lambda: false,
            overloads: Mutex::new(Vec::new()),
        }
    }

    /// Append-only: overloads accumulate during analysis and are never
    /// removed (spec.md §3, invariant 5).
    pub fn add_overload(&self, overload: Overload) {
        self.overloads.lock().unwrap().push(overload);
    }

    pub fn overloads(&self) -> Vec<Overload> {
        self.overloads.lock().unwrap().clone()
    }

    pub fn overload_count(&self) -> usize {
        self.overloads.lock().unwrap().len()
    }

    /// Replace the single most recently added overload wholesale — used
    /// only by the stub-override rule (spec.md §4.D.2), which needs to swap
    /// the source's freshly-created overload for the stub's signature while
    /// keeping the source's docstring.
    pub fn replace_last_overload(&self, overload: Overload) {
        let mut overloads = self.overloads.lock().unwrap();
        if let Some(slot) = overloads.last_mut() {
            *slot = overload;
        } else {
            overloads.push(overload);
        }
    }
}

/// A module, standing in for the module-as-scope-owner described in spec.md
/// §4.F.4.
pub struct ModuleType {
    pub handle: Option<ModuleHandle>,
}

/// A handful of builtin scalar types the constant-folding machinery needs to
/// name (spec.md §3, `Constant`: "a literal value carrying a builtin type id
/// and its raw value").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, strum::Display)]
pub enum BuiltinTypeId {
    Int,
    Float,
    Str,
    Bytes,
    Bool,
    NoneType,
    Ellipsis,
    /// Any other builtin scalar not worth a dedicated variant (complex
    /// numbers, etc.) — still a builtin, just not individually named.
    Other,
}

impl Type {
    pub(crate) fn new(
        id: TypeId,
        name: Name,
        declaring_module: DeclaringModule,
        qualified_path: Vec<Name>,
        kind: TypeKind,
    ) -> Self {
        Self {
            id,
            name,
            declaring_module,
            qualified_path,
            documentation: Mutex::new(None),
            locations: Mutex::new(Vec::new()),
            kind,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn declaring_module(&self) -> DeclaringModule {
        self.declaring_module
    }

    pub fn documentation(&self) -> Option<String> {
        self.documentation.lock().unwrap().clone()
    }

    pub fn set_documentation(&self, doc: Option<String>) {
        if doc.is_some() {
            *self.documentation.lock().unwrap() = doc;
        }
    }

    pub fn member_type_tag(&self) -> MemberTypeTag {
        match &self.kind {
            TypeKind::Class(_) => MemberTypeTag::Class,
            TypeKind::Function(_) => MemberTypeTag::Function,
            TypeKind::Property(_) => MemberTypeTag::Property,
            TypeKind::Module(_) => MemberTypeTag::Module,
            TypeKind::Builtin(_) => MemberTypeTag::BuiltinValue,
        }
    }

    pub fn builtin_type_id(&self) -> Option<BuiltinTypeId> {
        match &self.kind {
            TypeKind::Builtin(id) => Some(*id),
            _ => None,
        }
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match &self.kind {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match &self.kind {
            TypeKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyType> {
        match &self.kind {
            TypeKind::Property(property) => Some(property),
            _ => None,
        }
    }

    /// Append a reference location (spec.md §4.A: "location tracking is on
    /// the type, not on the holding variable, unless the variable is
    /// user-declared").
    pub fn add_reference(&self, location: Location) {
        self.locations.lock().unwrap().push(location);
    }

    pub fn locations(&self) -> Vec<Location> {
        self.locations.lock().unwrap().clone()
    }

    /// This type's path segments from the module root (e.g. `["Outer",
    /// "method"]`), with no module prefix — what the stub-override rule
    /// (spec.md §4.D.2) matches a stub's own dotted path against.
    pub fn path_segments(&self) -> Vec<&str> {
        self.qualified_path.iter().map(Name::as_str).collect()
    }

    /// The stable dotted-qualified name described in spec.md §6 and given
    /// an algorithm in SPEC_FULL.md §10.E.
    pub fn qualified_name(&self, current_module_name: &str) -> String {
        let path = self.qualified_path.iter().map(Name::as_str).join(".");
        match self.declaring_module {
            DeclaringModule::Current => format!("{current_module_name}:{path}"),
            DeclaringModule::External(_) => path,
            DeclaringModule::Builtin => path,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("id", &self.id)
            .field("name", &self.name.as_str())
            .field("tag", &self.member_type_tag())
            .finish()
    }
}

/// An instance of a `Type` — the result of calling a class or annotating
/// with one (spec.md §3, `Instance`).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Instance {
    pub class: TypeId,
}

impl Instance {
    pub fn of(class: TypeId) -> Self {
        Self { class }
    }
}

/// A literal value carrying a builtin type id and its raw value (spec.md
/// §3, `Constant`).
#[derive(Debug, Clone)]
pub struct Constant {
    pub builtin_type: BuiltinTypeId,
    pub raw: ConstantValue,
}

/// The "raw value" payload of a [`Constant`]. Kept deliberately small: this
/// core never executes user code, so constant folding only needs enough
/// structure to drive system-predicate pruning (spec.md §4.D.3) and
/// `__all__` discovery (spec.md §4.F.4).
#[derive(Debug, Clone)]
pub enum ConstantValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    Ellipsis,
    /// A value whose exact content this core doesn't track (bytes, complex
    /// numbers, ...).
    Opaque,
}

impl Constant {
    pub fn int(value: i64) -> Self {
        Self {
            builtin_type: BuiltinTypeId::Int,
            raw: ConstantValue::Int(value),
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self {
            builtin_type: BuiltinTypeId::Str,
            raw: ConstantValue::Str(value.into()),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self {
            builtin_type: BuiltinTypeId::Bool,
            raw: ConstantValue::Bool(value),
        }
    }

    pub fn none() -> Self {
        Self {
            builtin_type: BuiltinTypeId::NoneType,
            raw: ConstantValue::None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.raw {
            ConstantValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.raw {
            ConstantValue::Bool(b) => Some(*b),
            ConstantValue::None => Some(false),
            ConstantValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }
}

// Re-exported so callers can write `types::Type` for both the struct and,
// via `TypeKind`, the sum it tags.
