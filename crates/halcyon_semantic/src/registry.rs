//! The evaluator registry (spec.md §4.E).
//!
//! A pending-work map plus a processed set, in place of the teacher's Salsa
//! query cache (spec.md "Design Notes" explicitly asks for this
//! substitution): the collector enqueues one [`PendingWork`] item per
//! class/function/property/module it discovers, and
//! [`crate::session::ModuleSession::analyze`] drains the queue in the three
//! waves spec.md §4.E lays out, dispatching each item to the matching
//! function in [`crate::member_evaluators`]. Work items carry no borrowed
//! data (just ids), so the registry itself never fights the borrow checker
//! over the AST or type table it describes work against.
//!
//! Every method takes `&self`: the evaluators this registry feeds (spec.md
//! §4.C's call resolution in particular) need to force a not-yet-processed
//! sibling's work mid-evaluation, on a shared [`crate::session::EvalContext`]
//! rather than a uniquely-borrowed one, so the bookkeeping lives behind a
//! [`Mutex`] the same way `Type`/`ClassType`/`Scope` already do.

use std::sync::Mutex;

use rustc_hash::FxHashSet;

use crate::node_key::NodeKey;
use crate::types::TypeId;

/// Which member evaluator a [`PendingWork`] item should be dispatched to
/// (spec.md §4.F: one evaluator per `Type` kind).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum WorkKind {
    Function,
    Class,
    Property,
}

/// "Finish resolving this type" (spec.md §4.E, "evaluator"): the type to
/// update, which evaluator to run, and the AST node to walk while doing it.
#[derive(Debug, Clone, Copy)]
pub struct PendingWork {
    pub type_id: TypeId,
    pub node: NodeKey,
    pub kind: WorkKind,
    /// The immediate enclosing class/function declaration this work's node
    /// was collected under, `None` at module level. Used by
    /// [`Registry::children_of`] to support `evaluate_scope` (spec.md
    /// §4.E): the class evaluator drives only the work declared directly
    /// inside its own body, rather than everything still pending.
    pub declaring_node: Option<NodeKey>,
}

#[derive(Default)]
struct State {
    pending: Vec<PendingWork>,
    processed: FxHashSet<TypeId>,
    in_progress: FxHashSet<TypeId>,
}

/// Tracks which types still need evaluation and prevents re-entrant
/// re-evaluation of a type that is already being resolved (spec.md §4.E:
/// "mark processed before invoking, so a cycle resolves to whatever the type
/// already carries rather than looping").
#[derive(Default)]
pub struct Registry {
    state: Mutex<State>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue work for `type_id` (spec.md §4.E, "add"). A type may be queued
    /// more than once (e.g. re-queued after a stub override); later
    /// registrations simply run after earlier ones. `declaring_node` is the
    /// immediate enclosing class/function this declaration sits directly
    /// inside, or `None` at module level.
    pub fn add(&self, type_id: TypeId, node: NodeKey, kind: WorkKind, declaring_node: Option<NodeKey>) {
        self.state.lock().unwrap().pending.push(PendingWork {
            type_id,
            node,
            kind,
            declaring_node,
        });
    }

    /// Snapshot (without removing) every item still pending directly inside
    /// `parent` (spec.md §4.E, `evaluate_scope(node)`). Non-destructive so
    /// [`crate::session::evaluate_scope`] can re-peek after each dispatch —
    /// a sibling forced out of turn by [`crate::evaluator::Evaluator`]'s
    /// on-demand call resolution (spec.md §4.C) is simply gone from the next
    /// snapshot, rather than stale in a pre-taken batch.
    pub fn children_of(&self, parent: NodeKey) -> Vec<PendingWork> {
        self.state
            .lock()
            .unwrap()
            .pending
            .iter()
            .filter(|w| w.declaring_node == Some(parent))
            .copied()
            .collect()
    }

    /// Remove and return the pending item declared at exactly `node`, if it
    /// is still queued. Used to claim one specific item picked from a
    /// [`Self::children_of`] snapshot without disturbing anything else still
    /// pending.
    pub fn take_node(&self, node: NodeKey) -> Option<PendingWork> {
        let mut state = self.state.lock().unwrap();
        let index = state.pending.iter().position(|w| w.node == node)?;
        Some(state.pending.remove(index))
    }

    pub fn is_processed(&self, type_id: TypeId) -> bool {
        self.state.lock().unwrap().processed.contains(&type_id)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// True while `type_id` is mid-evaluation on the current call stack
    /// (spec.md §4.E: used by a member evaluator to detect "I was asked to
    /// resolve something that is already resolving me").
    pub fn is_in_progress(&self, type_id: TypeId) -> bool {
        self.state.lock().unwrap().in_progress.contains(&type_id)
    }

    /// Remove and return the next still-pending item for `type_id`, if any
    /// (spec.md §4.E, "evaluate" — called repeatedly by the session driver
    /// until a type has no more queued work).
    pub fn take_next_for(&self, type_id: TypeId) -> Option<PendingWork> {
        let mut state = self.state.lock().unwrap();
        let index = state.pending.iter().position(|w| w.type_id == type_id)?;
        Some(state.pending.remove(index))
    }

    pub fn begin(&self, type_id: TypeId) {
        self.state.lock().unwrap().in_progress.insert(type_id);
    }

    pub fn finish(&self, type_id: TypeId) {
        let mut state = self.state.lock().unwrap();
        state.in_progress.remove(&type_id);
        state.processed.insert(type_id);
    }

    /// Snapshot of every type id with at least one pending item, in FIFO
    /// registration order (spec.md §4.E, "evaluate_all"'s wave ordering:
    /// functions are registered before classes, which are registered before
    /// everything else, so draining in this order already yields the
    /// three-wave pass the spec describes).
    pub fn pending_type_ids(&self) -> Vec<TypeId> {
        let state = self.state.lock().unwrap();
        let mut seen = FxHashSet::default();
        let mut ids = Vec::new();
        for work in &state.pending {
            if seen.insert(work.type_id) {
                ids.push(work.type_id);
            }
        }
        ids
    }
}
