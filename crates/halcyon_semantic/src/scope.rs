//! The scope stack (spec.md §4.B).
//!
//! Scopes are arena-owned (spec.md "Design Notes": arena + index instead of
//! `Rc`/`RefCell>` parent pointers), so a [`Scope`]'s outer scope is a plain
//! [`ScopeId`] rather than a back-reference. Grounded on
//! `red_knot_python_semantic::semantic_index::symbol::ScopeId`/`Scope`, with
//! the use-def/narrowing machinery that crate builds on top stripped out —
//! spec.md's Non-goals rule out "flow-sensitive narrowing", so a scope here
//! only needs one current binding per name, not a control-flow-indexed set
//! of them.

use std::sync::Mutex;

use indexmap::IndexMap;
use ruff_python_ast::name::Name;

use crate::collaborators::Location;
use crate::member::{Member, Variable, VariableSource};
use crate::node_key::NodeKey;

/// Arena index into a [`crate::session::ModuleSession`]'s scope table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Lambda,
    /// A comprehension's own implicit scope (`[x for x in ...]`).
    Comprehension,
}

impl ScopeKind {
    /// Whether a plain name lookup skips this scope when searching outward
    /// from an inner scope (spec.md §4.B: "class scopes are invisible to
    /// nested function scopes", mirroring ordinary Python name resolution).
    pub fn is_visible_to_nested_scopes(self) -> bool {
        !matches!(self, ScopeKind::Class)
    }
}

/// How far a [`Scope::lookup`] is willing to search (spec.md §4.B).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LookupOptions {
    /// Only the scope itself.
    LocalOnly,
    /// The scope plus its imported names, but no enclosing scopes.
    ImportedToo,
    /// The full chain, including the synthetic builtins scope.
    BuiltinsToo,
    /// The full chain up to (not including) builtins — ordinary Python name
    /// resolution for a reference inside a function or class body.
    Normal,
}

/// One entry in the scope stack (spec.md §4.B, "Scope").
pub struct Scope {
    id: ScopeId,
    kind: ScopeKind,
    outer: Option<ScopeId>,
    /// The AST node this scope was opened for (`StmtFunctionDef`,
    /// `StmtClassDef`, the module itself, ...). `None` for the synthetic
    /// builtins scope.
    origin: Option<NodeKey>,
    declared: Mutex<IndexMap<Name, Variable>>,
    imported: Mutex<IndexMap<Name, Variable>>,
    children: Mutex<Vec<ScopeId>>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, outer: Option<ScopeId>, origin: Option<NodeKey>) -> Self {
        Self {
            id,
            kind,
            outer,
            origin,
            declared: Mutex::new(IndexMap::new()),
            imported: Mutex::new(IndexMap::new()),
            children: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn outer(&self) -> Option<ScopeId> {
        self.outer
    }

    pub fn origin(&self) -> Option<NodeKey> {
        self.origin
    }

    pub fn children(&self) -> Vec<ScopeId> {
        self.children.lock().unwrap().clone()
    }

    /// Bind `name` to `value` in this scope (spec.md §4.B, "declare"). A
    /// re-declaration of an existing name simply overwrites its value;
    /// spec.md's Open Question on conflicting re-declarations is resolved
    /// (see DESIGN.md) by silently taking the newest binding, never erroring.
    pub fn declare(&self, name: Name, value: Member, source: VariableSource) {
        let table = match source {
            VariableSource::Import => &self.imported,
            _ => &self.declared,
        };
        table
            .lock()
            .unwrap()
            .insert(name.clone(), Variable::new(name, value, source));
    }

    /// Look up `name` in exactly this scope's own tables, no outward search
    /// (spec.md §4.B, "get_in_scope").
    pub fn get_in_scope(&self, name: &str) -> Option<Member> {
        if let Some(var) = self.declared.lock().unwrap().get(name) {
            return Some(var.value());
        }
        self.imported.lock().unwrap().get(name).map(Variable::value)
    }

    /// Attach a reference location to an already-declared local variable
    /// (spec.md §4.A, "Key rule": a user-declared assignment's locations
    /// live on the `Variable`, not the `Type`). No-op if `name` isn't
    /// declared locally — imported names and synthesized bindings don't
    /// track locations this way.
    pub fn record_location(&self, name: &str, location: Location) {
        if let Some(var) = self.declared.lock().unwrap().get(name) {
            var.add_location(location);
        }
    }

    fn declared_names(&self) -> Vec<Name> {
        self.declared.lock().unwrap().keys().cloned().collect()
    }

    /// Drops every locally-declared binding (spec.md §4.F.2 step 6: a
    /// library function's locals are cleared after evaluation once nothing
    /// still needs to resolve a name through this scope). Imported names
    /// and child-scope links are untouched.
    pub fn clear_declared(&self) {
        self.declared.lock().unwrap().clear();
    }

    /// This scope's own declared bindings, insertion order preserved
    /// (spec.md §3: "insertion order preserved for stable hover"). Used by
    /// the class evaluator to turn a class body's scope into the class's
    /// member map (spec.md §4.F.1).
    pub fn declared_members(&self) -> IndexMap<Name, Member> {
        self.declared
            .lock()
            .unwrap()
            .iter()
            .map(|(name, var)| (name.clone(), var.value()))
            .collect()
    }
}

/// Owns every [`Scope`] created while analysing one module (spec.md §4.B).
pub struct ScopeArena {
    scopes: Vec<Scope>,
    builtins: ScopeId,
}

impl ScopeArena {
    /// Creates the arena with its module scope (index 0) and a synthetic
    /// builtins scope already open, per spec.md §4.B: "the builtins scope is
    /// always present and always last in the outward search order".
    pub fn new() -> Self {
        let mut scopes = Vec::new();
        scopes.push(Scope::new(ScopeId(0), ScopeKind::Module, None, None));
        let builtins_id = ScopeId(1);
        scopes.push(Scope::new(builtins_id, ScopeKind::Module, None, None));
        Self {
            scopes,
            builtins: builtins_id,
        }
    }

    pub fn module_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn builtins_scope(&self) -> ScopeId {
        self.builtins
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Opens a new child scope under `outer` (spec.md §4.B, "open" /
    /// `ScopeGuard`).
    pub fn open(&mut self, kind: ScopeKind, outer: ScopeId, origin: NodeKey) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, Some(outer), Some(origin)));
        self.scopes[outer.0 as usize].children.lock().unwrap().push(id);
        tracing::trace!(?kind, scope = id.0, outer = outer.0, "scope opened");
        id
    }

    /// Whether `id` still has a child scope that is itself a class or
    /// function declaration (spec.md §4.F.2 step 6: locals-clearing must
    /// leave a scope alone while a nested definition might still need to
    /// resolve a name through it).
    pub fn has_nested_definition_scope(&self, id: ScopeId) -> bool {
        self.scope(id)
            .children()
            .iter()
            .any(|child| matches!(self.scope(*child).kind(), ScopeKind::Class | ScopeKind::Function))
    }

    /// Walks outward from `start`, applying `options`, returning the first
    /// binding found (spec.md §4.B, "lookup").
    pub fn lookup(&self, start: ScopeId, name: &str, options: LookupOptions) -> Option<Member> {
        if matches!(options, LookupOptions::LocalOnly) {
            return self.scope(start).get_in_scope(name);
        }

        let mut current = Some(start);
        let mut first = true;
        while let Some(id) = current {
            let scope = self.scope(id);
            let visible = first || scope.kind.is_visible_to_nested_scopes();
            if visible {
                if let Some(value) = scope.get_in_scope(name) {
                    return Some(value);
                }
            }
            first = false;
            current = scope.outer;
            if current.is_none() && matches!(options, LookupOptions::ImportedToo) {
                break;
            }
        }

        if matches!(options, LookupOptions::BuiltinsToo) {
            return self.scope(self.builtins).get_in_scope(name);
        }
        None
    }

    /// Collects every name visible from `start` out to (not including) the
    /// builtins scope, innermost binding wins (spec.md §4.B,
    /// "enumerate_towards_global" — used to build completion/hover listings
    /// and `__all__` default discovery, spec.md §4.F.4).
    pub fn enumerate_towards_global(&self, start: ScopeId) -> IndexMap<Name, Member> {
        let mut result = IndexMap::new();
        let mut current = Some(start);
        let mut first = true;
        while let Some(id) = current {
            let scope = self.scope(id);
            let visible = first || scope.kind.is_visible_to_nested_scopes();
            if visible {
                for name in scope.declared_names() {
                    if !result.contains_key(&name) {
                        if let Some(value) = scope.get_in_scope(&name) {
                            result.insert(name, value);
                        }
                    }
                }
            }
            first = false;
            current = scope.outer;
        }
        result
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by opening a scope during collection: dropping it is
/// purely documentation (the arena never needs an explicit close), but it
/// gives the collector a value to hold for "for the duration of this
/// function/class body" the way a lexical block would (spec.md §4.B,
/// "ScopeGuard").
pub struct ScopeGuard {
    pub id: ScopeId,
    previous: ScopeId,
}

impl ScopeGuard {
    pub fn new(id: ScopeId, previous: ScopeId) -> Self {
        Self { id, previous }
    }

    pub fn previous(&self) -> ScopeId {
        self.previous
    }
}
