//! Class type representation (spec.md §3, "Class type").

use std::sync::Mutex;

use indexmap::IndexMap;
use ruff_python_ast::name::Name;

use crate::member::Member;
use crate::node_key::NodeKey;
use crate::types::TypeId;

/// A class's own data: its resolved base list, its member map, and whether
/// it is generic.
///
/// Grounded on `red_knot_python_semantic::types::class::Class`, trimmed to
/// drop MRO linearization and metaclass inference — spec.md only asks for
/// an *ordered base list*, not a computed method-resolution order, and
/// Non-goals explicitly exclude "exhaustive generic instantiation".
pub struct ClassType {
    /// Resolved bases, in source order (spec.md §3: "ordered base list
    /// (after resolution)"). Populated once, by the class evaluator
    /// (spec.md §4.F.1, step 4); `None` until then.
    bases: Mutex<Option<Vec<TypeId>>>,
    /// Member map, insertion order preserved for stable hover (spec.md §3).
    /// Append-only under a mutex (spec.md §4.A).
    members: Mutex<IndexMap<Name, Member>>,
    is_generic: Mutex<bool>,
    /// Identifies the `ast::StmtClassDef` this type was created from, so
    /// the class evaluator can re-walk the body on re-entrant evaluation.
    definition_node: NodeKey,
}

impl ClassType {
    pub fn new(definition_node: NodeKey) -> Self {
        Self {
            bases: Mutex::new(None),
            members: Mutex::new(IndexMap::new()),
            is_generic: Mutex::new(false),
            definition_node,
        }
    }

    pub fn definition_node(&self) -> NodeKey {
        self.definition_node
    }

    /// `None` before the class evaluator has run (spec.md §3, invariant 4:
    /// "every user-defined type has ... an unresolved base list" right
    /// after collection).
    pub fn bases(&self) -> Option<Vec<TypeId>> {
        self.bases.lock().unwrap().clone()
    }

    pub fn set_bases(&self, bases: Vec<TypeId>) {
        *self.bases.lock().unwrap() = Some(bases);
    }

    pub fn set_generic(&self, is_generic: bool) {
        *self.is_generic.lock().unwrap() = is_generic;
    }

    pub fn is_generic(&self) -> bool {
        *self.is_generic.lock().unwrap()
    }

    /// Insert or overwrite a member, preserving first-insertion order for
    /// names that already exist.
    pub fn set_member(&self, name: Name, member: Member) {
        self.members.lock().unwrap().insert(name, member);
    }

    pub fn member(&self, name: &str) -> Option<Member> {
        self.members.lock().unwrap().get(name).cloned()
    }

    pub fn members(&self) -> IndexMap<Name, Member> {
        self.members.lock().unwrap().clone()
    }

    pub fn member_names(&self) -> Vec<Name> {
        self.members.lock().unwrap().keys().cloned().collect()
    }
}
