//! The property evaluator (spec.md §4.F.3).
//!
//! A property is "like a function but with exactly one overload and an
//! `is_abstract` flag" (spec.md §3); this evaluator builds that one overload
//! from the `@property` getter (or a later `@x.setter`/`@x.deleter`, which
//! shares the same `Type` — see [`crate::collector`]) the same way
//! [`crate::member_evaluators::evaluate_function`] builds a function's
//! overload, then stores it with [`crate::types::PropertyType::set_overload`]
//! instead of appending.

use ruff_python_ast::{self as ast};
use ruff_text_size::Ranged;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::evaluator::Evaluator;
use crate::member::Member;
use crate::scope::ScopeId;
use crate::session::EvalContext;
use crate::types::{Instance, Overload, PropertyType, TypeId};

pub fn evaluate_property(ctx: EvalContext, type_id: TypeId, func_def: &ast::StmtFunctionDef, body_scope: ScopeId) {
    let ty = ctx.type_(type_id);
    let Some(property) = ty.as_property() else {
        return;
    };
    let _span = tracing::trace_span!("evaluate_property", name = func_def.name.as_str()).entered();

    check_property_decorator_combination(ctx, func_def, property);

    let evaluator = Evaluator::new(ctx);
    let outer_scope = ctx.scope(body_scope).outer().unwrap_or(body_scope);

    // The getter's `self` is bound to an instance of the declaring class,
    // same as an ordinary bound method (spec.md §4.F.2, step 4a; properties
    // are accessed through an instance the same way).
    let first_param_type = property
        .declaring_type
        .map(|declaring_id| Member::Instance(Instance::of(declaring_id)));

    let mut overload = Overload::new().with_documentation(ty.documentation());
    overload.parameters =
        super::function_eval::build_parameters(ctx, func_def, &evaluator, outer_scope, body_scope, first_param_type);

    if let Some(returns) = func_def.returns.as_deref() {
        let declared = evaluator.type_from_annotation(returns, outer_scope);
        overload.set_authoritative_return(declared);
    }
    property.set_overload(overload);
}

/// spec.md §4.F.3: "an unabstract property must not carry `staticmethod` or
/// `classmethod`; violations emit `InvalidDecoratorCombination` warnings.
/// Abstract properties accept any combination (they will be overridden)."
fn check_property_decorator_combination(ctx: EvalContext, func_def: &ast::StmtFunctionDef, property: &PropertyType) {
    if property.is_abstract() || !(property.is_static || property.is_class_method) {
        return;
    }
    let which = if property.is_static && property.is_class_method {
        "staticmethod and classmethod"
    } else if property.is_static {
        "staticmethod"
    } else {
        "classmethod"
    };
    ctx.diagnostics.borrow_mut().report(Diagnostic::new(
        DiagnosticCode::InvalidDecoratorCombination,
        func_def.range(),
        "property_eval",
        format!(
            "property `{}` cannot also be a {which}",
            func_def.name.as_str()
        ),
    ));
}
