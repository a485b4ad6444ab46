//! The module session (ties Parse → Collect → Evaluate together).
//!
//! Grounded on `red_knot_python_semantic`'s per-file `SemanticIndex` plus its
//! Salsa-memoized `infer_*` query family, collapsed into one eager pass:
//! spec.md's "Design Notes" replace Salsa's reentrant query cache with the
//! registry's explicit pending/processed bookkeeping (see
//! [`crate::registry`]), so there is no incremental re-entry to model here —
//! `analyze` runs collection once, then evaluation once, and returns.

use std::cell::RefCell;
use std::collections::HashMap;

use ruff_python_ast::{self as ast};

use crate::collaborators::{DiagnosticsSink, HostInfo, ModuleResolver, StubProvider};
use crate::collector::{Collector, NodeRef};
use crate::config::AnalysisOptions;
use crate::member::Member;
use crate::member_evaluators::{evaluate_class, evaluate_function, evaluate_module, evaluate_property};
use crate::node_key::NodeKey;
use crate::python_version::PythonVersion;
use crate::registry::{Registry, WorkKind};
use crate::scope::{Scope, ScopeArena, ScopeId};
use crate::types::{Type, TypeId};
use crate::InternalError;

/// Read-only data every member evaluator needs. All fields are shared
/// references or `Copy` values, so this is cheap to pass by value into each
/// dispatch (spec.md §4.F: evaluators are pure functions of the collected
/// state, not closures holding their own borrows). `registry` and
/// `diagnostics` are the one exception to "read-only": both sit behind
/// interior mutability (the registry behind its own `Mutex`, diagnostics
/// behind a `RefCell`) specifically so [`crate::evaluator::Evaluator`] can
/// force a not-yet-evaluated callee's work on demand (spec.md §4.C) without
/// this struct losing its `Copy` derive.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub types: &'a [Type],
    pub scopes: &'a ScopeArena,
    pub nodes: &'a HashMap<NodeKey, NodeRef<'a>>,
    pub node_scopes: &'a HashMap<NodeKey, ScopeId>,
    pub module_name: &'a str,
    pub python_version: PythonVersion,
    pub options: &'a AnalysisOptions,
    pub stubs: &'a dyn StubProvider,
    pub registry: &'a Registry,
    pub diagnostics: &'a RefCell<&'a mut dyn DiagnosticsSink>,
}

impl<'a> EvalContext<'a> {
    pub fn scope(&self, id: ScopeId) -> &'a Scope {
        self.scopes.scope(id)
    }

    pub fn type_(&self, id: TypeId) -> &'a Type {
        &self.types[id.0 as usize]
    }
}

/// The result of analysing one module (spec.md: the "Module symbol table
/// and lazy type-evaluation engine" entry point).
pub struct ModuleSession {
    types: Vec<Type>,
    scopes: ScopeArena,
    module_scope: ScopeId,
    exports: Vec<ruff_python_ast::name::Name>,
}

impl ModuleSession {
    /// Parse output is supplied by the caller (the `Parser` collaborator is
    /// external, spec.md's Non-goals) — this only needs the already-built
    /// tree, plus read-mostly collaborators for module resolution, stub
    /// lookup, diagnostics and host info.
    #[allow(clippy::too_many_arguments)]
    pub fn analyze(
        module: &ast::ModModule,
        options: &AnalysisOptions,
        module_name: &str,
        python_version: PythonVersion,
        resolver: &dyn ModuleResolver,
        stubs: &dyn StubProvider,
        host: &dyn HostInfo,
        diagnostics: &mut dyn DiagnosticsSink,
    ) -> Result<Self, InternalError> {
        let collector = Collector::new(options, python_version, resolver, stubs, host);
        let collected = collector.collect(module);

        let registry = collected.registry;
        let diagnostics = RefCell::new(diagnostics);
        let ctx = EvalContext {
            types: &collected.types,
            scopes: &collected.scopes,
            nodes: &collected.nodes,
            node_scopes: &collected.node_scopes,
            module_name,
            python_version,
            options,
            stubs,
            registry: &registry,
            diagnostics: &diagnostics,
        };

        Self::drain_registry(ctx)?;

        let exports = evaluate_module(ctx, collected.module_scope, collected.explicit_exports);

        Ok(Self {
            types: collected.types,
            scopes: collected.scopes,
            module_scope: collected.module_scope,
            exports,
        })
    }

    /// Drains the registry's pending work. Registration order already
    /// produces the three-wave ordering spec.md §4.E calls for (functions,
    /// then classes, then whatever's left), since the collector registers
    /// work in that relative order as it walks the tree; we simply drain
    /// front-to-back, per type id, marking each done once its queue for
    /// that id is empty.
    fn drain_registry(ctx: EvalContext) -> Result<(), InternalError> {
        loop {
            let ids = ctx.registry.pending_type_ids();
            if ids.is_empty() {
                break;
            }
            for type_id in ids {
                ctx.registry.begin(type_id);
                while let Some(work) = ctx.registry.take_next_for(type_id) {
                    dispatch(ctx, &work)?;
                }
                ctx.registry.finish(type_id);
            }
        }
        Ok(())
    }

    pub fn module_scope(&self) -> ScopeId {
        self.module_scope
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn type_(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    /// The module's resolved export list, whether from an explicit
    /// `__all__` or the "every public name" default (spec.md §4.F.4).
    pub fn exports(&self) -> &[ruff_python_ast::name::Name] {
        &self.exports
    }

    /// Look up a top-level name, primarily for tests and `reveal_type()`
    /// support (SPEC_FULL.md §10.E).
    pub fn lookup_module_level(&self, name: &str) -> Option<Member> {
        self.scopes.scope(self.module_scope).get_in_scope(name)
    }
}

/// Run one [`crate::registry::PendingWork`] item through its matching member
/// evaluator (spec.md §4.E, "evaluate": "mark the node processed ... then
/// invoke the evaluator"). Free function rather than a method so both the
/// top-level drain loop and [`evaluate_scope`] (in turn called from the
/// class evaluator) can share it without needing a `ModuleSession` handle.
pub(crate) fn dispatch(ctx: EvalContext, work: &crate::registry::PendingWork) -> Result<(), InternalError> {
    let node = ctx
        .nodes
        .get(&work.node)
        .ok_or(InternalError::RegistryInconsistent("pending work node not found"))?;
    tracing::trace!(kind = ?work.kind, type_id = work.type_id.0, "evaluator dispatched");
    match (work.kind, node) {
        (WorkKind::Class, NodeRef::Class(class_def)) => {
            let own_scope = *ctx
                .node_scopes
                .get(&work.node)
                .ok_or(InternalError::RegistryInconsistent("class scope not found"))?;
            evaluate_class(ctx, work.type_id, class_def, own_scope, work.node)
        }
        (WorkKind::Function, NodeRef::Function(func_def)) => {
            let own_scope = *ctx
                .node_scopes
                .get(&work.node)
                .ok_or(InternalError::RegistryInconsistent("function scope not found"))?;
            evaluate_function(ctx, work.type_id, func_def, own_scope);
            Ok(())
        }
        (WorkKind::Property, NodeRef::Function(func_def)) => {
            let own_scope = *ctx
                .node_scopes
                .get(&work.node)
                .ok_or(InternalError::RegistryInconsistent("property scope not found"))?;
            evaluate_property(ctx, work.type_id, func_def, own_scope);
            Ok(())
        }
        _ => Err(InternalError::RegistryInconsistent(
            "work kind did not match the node it was queued against",
        )),
    }
}

/// spec.md §4.E, `evaluate_scope(node)`: "drive only evaluators whose
/// declaration is an immediate child of `node`." Used by the class
/// evaluator (spec.md §4.F.1 step 6) to force its constructors, then its
/// remaining method bodies, to evaluate before the class-body pass returns —
/// so a method referencing a sibling defined later in the same class sees
/// that sibling's overload already resolved, rather than only getting it
/// from the registry's own later, unordered drain.
pub(crate) fn evaluate_scope(ctx: EvalContext, parent: NodeKey) -> Result<(), InternalError> {
    loop {
        // spec.md §4.F.1 steps 3 and 6: inner classes evaluate first, then
        // constructors, then everything else — each group stable-sorted to
        // its original registration order. Re-peeked every iteration,
        // rather than taken as one upfront batch, so a sibling that
        // `crate::evaluator::Evaluator::force_evaluate` already pulled out
        // of turn (spec.md §4.C's on-demand call resolution) is simply
        // absent from the next snapshot instead of dispatched twice.
        let mut children = ctx.registry.children_of(parent);
        if children.is_empty() {
            return Ok(());
        }
        children.sort_by_key(|work| evaluation_rank(ctx, work));
        let chosen = children[0];
        let Some(work) = ctx.registry.take_node(chosen.node) else {
            // Already claimed (forced) between the snapshot and now; try again.
            continue;
        };
        ctx.registry.begin(work.type_id);
        dispatch(ctx, &work)?;
        ctx.registry.finish(work.type_id);
    }
}

fn evaluation_rank(ctx: EvalContext, work: &crate::registry::PendingWork) -> u8 {
    match (work.kind, ctx.nodes.get(&work.node)) {
        (WorkKind::Class, _) => 0,
        (WorkKind::Function, Some(NodeRef::Function(func_def)))
            if matches!(func_def.name.as_str(), "__init__" | "__new__") =>
        {
            1
        }
        _ => 2,
    }
}
