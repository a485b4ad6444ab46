//! The class evaluator (spec.md §4.F.1).
//!
//! Resolves a class's base list and builds its member map from its body
//! scope. Grounded on
//! `red_knot_python_semantic::types::infer::TypeInferenceBuilder::infer_class_body`,
//! trimmed of MRO linearization and metaclass inference (spec.md Non-goals).

use ruff_python_ast::{self as ast};
use ruff_text_size::Ranged;

use crate::collaborators::Location;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::evaluator::Evaluator;
use crate::node_key::NodeKey;
use crate::scope::ScopeId;
use crate::session::EvalContext;
use crate::types::TypeId;
use crate::InternalError;

/// Resolve `class_def`'s bases and populate its member map (spec.md
/// §4.F.1):
/// 1. Evaluate each base expression; a base that doesn't resolve to a class
///    type reports [`DiagnosticCode::InheritNonClass`] and is dropped from
///    the base list rather than aborting the whole class.
/// 2. Copy the class body's own scope into the class's member map, in
///    declaration order.
/// 3. Force constructors, then every remaining method body, to evaluate via
///    `evaluate_scope` before returning (spec.md §4.F.1 step 6), so a sibling
///    method call resolves against an already-built overload rather than
///    whatever the registry's own later drain happens to produce.
pub fn evaluate_class(
    ctx: EvalContext,
    type_id: TypeId,
    class_def: &ast::StmtClassDef,
    class_scope: ScopeId,
    node_key: NodeKey,
) -> Result<(), InternalError> {
    let Some(class_type) = ctx.type_(type_id).as_class() else {
        return Ok(());
    };

    let evaluator = Evaluator::new(ctx);
    let outer_scope = ctx
        .scopes
        .scope(class_scope)
        .outer()
        .unwrap_or(class_scope);

    let mut bases = Vec::new();
    if let Some(arguments) = class_def.arguments.as_deref() {
        for base_expr in &arguments.args {
            let base_value = evaluator.evaluate(base_expr, outer_scope);
            match base_value.as_type() {
                Some(base_id) if ctx.type_(base_id).as_class().is_some() => {
                    // spec.md §4.F.1 step 4: "Register a reference on each
                    // base type pointing at this class's position."
                    ctx.type_(base_id).add_reference(Location::new(base_expr.range()));
                    bases.push(base_id);
                }
                _ => {
                    ctx.diagnostics.borrow_mut().report(Diagnostic::new(
                        DiagnosticCode::InheritNonClass,
                        base_expr.range(),
                        "class_eval",
                        format!(
                            "base of class `{}` does not resolve to a class",
                            class_def.name.as_str()
                        ),
                    ));
                }
            }
        }
    }
    class_type.set_bases(bases);

    for (name, member) in ctx.scope(class_scope).declared_members() {
        class_type.set_member(name, member);
    }

    crate::session::evaluate_scope(ctx, node_key)
}
