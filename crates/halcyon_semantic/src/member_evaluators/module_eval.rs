//! The module evaluator (spec.md §4.F.4).
//!
//! Resolves the module's export list: an explicit `__all__` literal (found
//! by the collector while scanning module-level assignments, see
//! [`crate::collector`]) takes precedence; otherwise every module-scope name
//! that doesn't start with an underscore is exported, in declaration order.
//! Grounded on `red_knot_python_semantic`'s `exported_names` query, run
//! eagerly here instead of as a Salsa query.

use ruff_python_ast::name::Name;

use crate::scope::ScopeId;
use crate::session::EvalContext;

pub fn evaluate_module(
    ctx: EvalContext,
    module_scope: ScopeId,
    explicit_exports: Option<Vec<Name>>,
) -> Vec<Name> {
    if let Some(exports) = explicit_exports {
        return exports;
    }
    ctx.scope(module_scope)
        .declared_members()
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !name.as_str().starts_with('_'))
        .collect()
}
