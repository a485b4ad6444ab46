//! The function evaluator (spec.md §4.F.2).
//!
//! Builds one [`Overload`] from a function's signature and body: parameter
//! types, a best-effort return value (from the return annotation if present,
//! otherwise the union of the body's `return` statements, or the yielded
//! type if it's a generator), and the `self`/`cls`/method-argument
//! diagnostics spec.md §6 names. Grounded on
//! `red_knot_python_semantic::types::infer::TypeInferenceBuilder::infer_function_body`,
//! without its flow-sensitive narrowing of parameter types across the body.

use ruff_python_ast::{self as ast, Expr, Stmt};
use ruff_text_size::Ranged;

use crate::collaborators::Location;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::evaluator::Evaluator;
use crate::member::{Member, VariableSource};
use crate::scope::{ScopeId, ScopeKind};
use crate::session::EvalContext;
use crate::types::{Instance, Overload, Parameter, ParameterKind, TypeId};

pub fn evaluate_function(
    ctx: EvalContext,
    type_id: TypeId,
    func_def: &ast::StmtFunctionDef,
    body_scope: ScopeId,
) {
    let ty = ctx.type_(type_id);
    let Some(function_type) = ty.as_function() else {
        return;
    };
    let _span = tracing::trace_span!("evaluate_function", name = func_def.name.as_str()).entered();

    // spec.md §4.D.2 / §4.F.2.1: the stub-override rule. If the stub
    // associated with this module declares an overload at the same dotted
    // path with the same positional arity, take it wholesale and never walk
    // this definition's body — only its docstring survives from the source.
    let positional_arity =
        func_def.parameters.posonlyargs.len() + func_def.parameters.args.len();
    if let Some(mut stub_overload) = ctx
        .stubs
        .own_stub_overload(&ty.path_segments(), positional_arity)
    {
        tracing::debug!(name = func_def.name.as_str(), "stub override applied");
        if let Some(doc) = ty.documentation() {
            stub_overload.documentation = Some(doc);
        }
        function_type.add_overload(stub_overload);
        return;
    }

    let evaluator = Evaluator::new(ctx);
    let outer_scope = ctx.scope(body_scope).outer().unwrap_or(body_scope);
    let is_method = function_type.declaring_type.is_some()
        && !function_type.is_static
        && ctx.scope(outer_scope).kind() == ScopeKind::Class;

    check_method_argument(ctx, func_def, function_type, is_method);

    // spec.md §4.F.2, step 4a: a bound or class method's first parameter is
    // `self`/`cls`, bound to an instance of (or the class itself, for
    // `@classmethod`) the declaring class rather than resolved from any
    // annotation/default it happens to carry.
    let first_param_type = if is_method {
        function_type.declaring_type.map(|declaring_id| {
            if function_type.is_class_method {
                Member::Type(declaring_id)
            } else {
                Member::Instance(Instance::of(declaring_id))
            }
        })
    } else {
        None
    };

    // spec.md §4.F.2 steps 1 and 6: a library or stub module never walks a
    // function body — its overload relies on the declared signature alone,
    // since the body may not even be runnable source.
    let skip_body_walk = ctx.options.is_library_module || ctx.options.is_stub_module;

    let mut overload = Overload::new().with_documentation(ty.documentation());
    overload.parameters = build_parameters(ctx, func_def, &evaluator, outer_scope, body_scope, first_param_type);
    overload.is_generator = !skip_body_walk && contains_yield(&func_def.body);

    if let Some(returns) = func_def.returns.as_deref() {
        let declared = evaluator.type_from_annotation(returns, outer_scope);
        overload.set_authoritative_return(declared);
    } else if !skip_body_walk {
        if overload.is_generator {
            collect_yield_values(&func_def.body, &evaluator, body_scope, &mut overload);
        } else {
            collect_return_values(&func_def.body, &evaluator, body_scope, &mut overload);
        }
    }

    check_return_in_init(ctx, func_def);
    if is_method && !skip_body_walk {
        collect_constructor_attributes(ctx, function_type, func_def, body_scope, &evaluator);
    }

    function_type.add_overload(overload);

    // spec.md §4.F.2 step 6: once a library function's local scope holds no
    // inner class/function declaration that might still need to look a name
    // up through it, its locals can be dropped — nothing outside the
    // function ever needs to resolve a name through a library function's
    // own body scope.
    if ctx.options.is_library_module
        && ctx.options.clear_library_function_locals
        && !ctx.scopes.has_nested_definition_scope(body_scope)
    {
        ctx.scope(body_scope).clear_declared();
    }
}

/// Builds one [`Parameter`] per signature entry and declares each into the
/// function's own body scope (spec.md §4.F.2, step 4), so a reference to a
/// parameter by name inside the body resolves to its type instead of
/// `Unknown`. Annotations and defaults are evaluated against `outer_scope` —
/// the scope the `def` itself lives in — matching ordinary Python scoping
/// (a parameter's default/annotation can't see the function's own body
/// scope, which doesn't exist yet when they're evaluated); this is also what
/// lets the "shadowed annotation" case resolve correctly, since otherwise an
/// annotation reusing a parameter's own name would shadow itself.
pub(super) fn build_parameters(
    ctx: EvalContext,
    func_def: &ast::StmtFunctionDef,
    evaluator: &Evaluator,
    outer_scope: ScopeId,
    body_scope: ScopeId,
    first_param_type: Option<Member>,
) -> Vec<Parameter> {
    let params = &func_def.parameters;
    let mut result = Vec::new();
    let mut index = 0usize;

    for p in &params.posonlyargs {
        let is_first = index == 0;
        index += 1;
        result.push(build_one(
            ctx,
            p,
            ParameterKind::PositionalOnly,
            evaluator,
            outer_scope,
            body_scope,
            is_first.then(|| first_param_type.clone()).flatten(),
        ));
    }
    for p in &params.args {
        let is_first = index == 0;
        index += 1;
        result.push(build_one(
            ctx,
            p,
            ParameterKind::PositionalOrKeyword,
            evaluator,
            outer_scope,
            body_scope,
            is_first.then(|| first_param_type.clone()).flatten(),
        ));
    }
    if let Some(vararg) = &params.vararg {
        let mut parameter = Parameter::new(
            ruff_python_ast::name::Name::new(vararg.name.as_str()),
            ParameterKind::Variadic,
        );
        parameter.annotated_type = vararg
            .annotation
            .as_deref()
            .map(|ann| evaluator.type_from_annotation(ann, outer_scope));
        declare_parameter(ctx, body_scope, &parameter);
        result.push(parameter);
    }
    for p in &params.kwonlyargs {
        result.push(build_one(
            ctx,
            p,
            ParameterKind::KeywordOnly,
            evaluator,
            outer_scope,
            body_scope,
            None,
        ));
    }
    if let Some(kwarg) = &params.kwarg {
        let mut parameter = Parameter::new(
            ruff_python_ast::name::Name::new(kwarg.name.as_str()),
            ParameterKind::KeywordDict,
        );
        parameter.annotated_type = kwarg
            .annotation
            .as_deref()
            .map(|ann| evaluator.type_from_annotation(ann, outer_scope));
        declare_parameter(ctx, body_scope, &parameter);
        result.push(parameter);
    }
    result
}

fn build_one(
    ctx: EvalContext,
    p: &ast::ParameterWithDefault,
    kind: ParameterKind,
    evaluator: &Evaluator,
    outer_scope: ScopeId,
    body_scope: ScopeId,
    bound_type: Option<Member>,
) -> Parameter {
    let mut parameter = Parameter::new(
        ruff_python_ast::name::Name::new(p.parameter.name.as_str()),
        kind,
    );
    if let Some(bound) = bound_type {
        parameter.annotated_type = Some(bound);
    } else {
        parameter.annotated_type = p
            .parameter
            .annotation
            .as_deref()
            .map(|ann| evaluator.type_from_annotation(ann, outer_scope));
    }
    parameter.default_value_type = p
        .default
        .as_deref()
        .map(|default| evaluator.evaluate(default, outer_scope));
    declare_parameter(ctx, body_scope, &parameter);
    parameter
}

fn declare_parameter(ctx: EvalContext, body_scope: ScopeId, parameter: &Parameter) {
    ctx.scope(body_scope).declare(
        parameter.name.clone(),
        parameter.resolved_type(),
        VariableSource::Declaration,
    );
}

/// spec.md §6: `NoSelfArgument` / `NoClsArgument` / `NoMethodArgument` — an
/// ordinary instance method with zero parameters, a `@classmethod` with zero
/// parameters, or (generically) any method body with no first parameter to
/// bind `self`/`cls` to at all.
fn check_method_argument(
    ctx: EvalContext,
    func_def: &ast::StmtFunctionDef,
    function_type: &crate::types::FunctionType,
    is_method: bool,
) {
    if !is_method || function_type.is_static {
        return;
    }
    let has_first_param = !func_def.parameters.posonlyargs.is_empty()
        || !func_def.parameters.args.is_empty();
    if has_first_param {
        return;
    }
    let code = if function_type.is_class_method {
        DiagnosticCode::NoClsArgument
    } else if function_type.is_lambda {
        DiagnosticCode::NoMethodArgument
    } else {
        DiagnosticCode::NoSelfArgument
    };
    ctx.diagnostics.borrow_mut().report(Diagnostic::new(
        code,
        func_def.range(),
        "function_eval",
        format!("method `{}` takes no arguments", func_def.name.as_str()),
    ));
}

/// spec.md §6: `ReturnInInit` — `__init__` must not `return` a value.
fn check_return_in_init(ctx: EvalContext, func_def: &ast::StmtFunctionDef) {
    if func_def.name.as_str() != "__init__" {
        return;
    }
    for stmt in &func_def.body {
        if let Stmt::Return(ast::StmtReturn {
            value: Some(value),
            range,
        }) = stmt
        {
            ctx.diagnostics.borrow_mut().report(Diagnostic::new(
                DiagnosticCode::ReturnInInit,
                *range,
                "function_eval",
                "`__init__` must not return a value".to_string(),
            ));
            let _ = value;
        }
    }
}

fn contains_yield(body: &[Stmt]) -> bool {
    body.iter().any(stmt_contains_yield)
}

fn stmt_contains_yield(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(ast::StmtExpr { value, .. }) => expr_contains_yield(value),
        Stmt::Assign(ast::StmtAssign { value, .. }) => expr_contains_yield(value),
        Stmt::If(ast::StmtIf {
            body,
            elif_else_clauses,
            ..
        }) => {
            body.iter().any(stmt_contains_yield)
                || elif_else_clauses
                    .iter()
                    .any(|clause| clause.body.iter().any(stmt_contains_yield))
        }
        Stmt::For(ast::StmtFor { body, orelse, .. })
        | Stmt::While(ast::StmtWhile { body, orelse, .. }) => {
            body.iter().any(stmt_contains_yield) || orelse.iter().any(stmt_contains_yield)
        }
        Stmt::With(ast::StmtWith { body, .. }) => body.iter().any(stmt_contains_yield),
        Stmt::Try(ast::StmtTry {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        }) => {
            body.iter().any(stmt_contains_yield)
                || handlers.iter().any(|h| {
                    let ast::ExceptHandler::ExceptHandler(h) = h;
                    h.body.iter().any(stmt_contains_yield)
                })
                || orelse.iter().any(stmt_contains_yield)
                || finalbody.iter().any(stmt_contains_yield)
        }
        _ => false,
    }
}

fn expr_contains_yield(expr: &Expr) -> bool {
    matches!(expr, Expr::Yield(_) | Expr::YieldFrom(_))
}

/// Walks top-level-only `return` statements (no flow narrowing through
/// nested branches is attempted beyond simple recursion into `if`/`try`
/// bodies) to build the overload's return set (spec.md §4.F.2, step 3 and
/// step 5). Stops adding once an explicit annotation has made the return
/// authoritative — a no-op in this call path, since it's only reached when
/// there was no annotation, but kept so the helper matches the invariant
/// `Overload::add_return_value` already enforces.
fn collect_return_values(
    body: &[Stmt],
    evaluator: &Evaluator,
    scope: ScopeId,
    overload: &mut Overload,
) {
    for stmt in body {
        match stmt {
            Stmt::Return(ast::StmtReturn {
                value: Some(value), ..
            }) => {
                overload.add_return_value(evaluator.evaluate(value, scope));
            }
            Stmt::Return(ast::StmtReturn { value: None, .. }) => {
                overload.add_return_value(Member::Constant(crate::types::Constant::none()));
            }
            Stmt::If(ast::StmtIf {
                body,
                elif_else_clauses,
                ..
            }) => {
                collect_return_values(body, evaluator, scope, overload);
                for clause in elif_else_clauses {
                    collect_return_values(&clause.body, evaluator, scope, overload);
                }
            }
            Stmt::For(ast::StmtFor { body, orelse, .. })
            | Stmt::While(ast::StmtWhile { body, orelse, .. }) => {
                collect_return_values(body, evaluator, scope, overload);
                collect_return_values(orelse, evaluator, scope, overload);
            }
            Stmt::With(ast::StmtWith { body, .. }) => {
                collect_return_values(body, evaluator, scope, overload)
            }
            Stmt::Try(ast::StmtTry {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            }) => {
                collect_return_values(body, evaluator, scope, overload);
                for handler in handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    collect_return_values(&handler.body, evaluator, scope, overload);
                }
                collect_return_values(orelse, evaluator, scope, overload);
                collect_return_values(finalbody, evaluator, scope, overload);
            }
            _ => {}
        }
    }
}

/// Same shape as [`collect_return_values`], but for a generator body: the
/// overload's return set is the union of yielded values (spec.md §4.F.2,
/// step 3's "or the yielded type if it's a generator") rather than of
/// `return`-statement values, since a bare `return` inside a generator just
/// ends iteration and carries no value of its own.
fn collect_yield_values(
    body: &[Stmt],
    evaluator: &Evaluator,
    scope: ScopeId,
    overload: &mut Overload,
) {
    for stmt in body {
        match stmt {
            Stmt::Expr(ast::StmtExpr { value, .. }) => {
                collect_yield_values_in_expr(value, evaluator, scope, overload);
            }
            Stmt::Assign(ast::StmtAssign { value, .. }) => {
                collect_yield_values_in_expr(value, evaluator, scope, overload);
            }
            Stmt::If(ast::StmtIf {
                body,
                elif_else_clauses,
                ..
            }) => {
                collect_yield_values(body, evaluator, scope, overload);
                for clause in elif_else_clauses {
                    collect_yield_values(&clause.body, evaluator, scope, overload);
                }
            }
            Stmt::For(ast::StmtFor { body, orelse, .. })
            | Stmt::While(ast::StmtWhile { body, orelse, .. }) => {
                collect_yield_values(body, evaluator, scope, overload);
                collect_yield_values(orelse, evaluator, scope, overload);
            }
            Stmt::With(ast::StmtWith { body, .. }) => {
                collect_yield_values(body, evaluator, scope, overload)
            }
            Stmt::Try(ast::StmtTry {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            }) => {
                collect_yield_values(body, evaluator, scope, overload);
                for handler in handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    collect_yield_values(&handler.body, evaluator, scope, overload);
                }
                collect_yield_values(orelse, evaluator, scope, overload);
                collect_yield_values(finalbody, evaluator, scope, overload);
            }
            _ => {}
        }
    }
}

fn collect_yield_values_in_expr(
    expr: &Expr,
    evaluator: &Evaluator,
    scope: ScopeId,
    overload: &mut Overload,
) {
    match expr {
        Expr::Yield(ast::ExprYield {
            value: Some(value), ..
        }) => overload.add_return_value(evaluator.evaluate(value, scope)),
        Expr::Yield(ast::ExprYield { value: None, .. }) => {
            overload.add_return_value(Member::Constant(crate::types::Constant::none()));
        }
        Expr::YieldFrom(ast::ExprYieldFrom { value, .. }) => {
            overload.add_return_value(evaluator.evaluate(value, scope));
        }
        _ => {}
    }
}

/// spec.md §4.F.2: a method body's `self.x = ...` assignments declare
/// attributes on the declaring class, visible the same way an explicit
/// class-body assignment would be. Only `__init__`-like constructors are
/// special in that their attribute assignments are the ones hover/completion
/// cares most about, but this core attributes every method's `self.x = ...`
/// the same way, matching ordinary Python attribute-visibility rules.
fn collect_constructor_attributes(
    ctx: EvalContext,
    function_type: &crate::types::FunctionType,
    func_def: &ast::StmtFunctionDef,
    body_scope: ScopeId,
    evaluator: &Evaluator,
) {
    let Some(declaring_id) = function_type.declaring_type else {
        return;
    };
    let Some(declaring_class) = ctx.type_(declaring_id).as_class() else {
        return;
    };
    let self_name = func_def
        .parameters
        .posonlyargs
        .first()
        .or_else(|| func_def.parameters.args.first())
        .map(|p| p.parameter.name.as_str());
    let Some(self_name) = self_name else {
        return;
    };

    walk_self_assignments(&func_def.body, self_name, evaluator, body_scope, |name, value, range| {
        declaring_class.set_member(
            ruff_python_ast::name::Name::new(name),
            value.clone(),
        );
        if let crate::types::TypeKind::Class(_) = ctx.type_(declaring_id).kind() {
            ctx.type_(declaring_id).add_reference(Location::new(range));
        }
    });
}

fn walk_self_assignments(
    body: &[Stmt],
    self_name: &str,
    evaluator: &Evaluator,
    scope: ScopeId,
    mut on_attr: impl FnMut(&str, &Member, ruff_text_size::TextRange),
) {
    for stmt in body {
        match stmt {
            Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
                for target in targets {
                    if let Expr::Attribute(ast::ExprAttribute { value: base, attr, .. }) = target {
                        if is_name(base, self_name) {
                            let resolved = evaluator.evaluate(value, scope);
                            on_attr(attr.as_str(), &resolved, target.range());
                        }
                    }
                }
            }
            Stmt::AnnAssign(ast::StmtAnnAssign {
                target,
                annotation,
                ..
            }) => {
                if let Expr::Attribute(ast::ExprAttribute { value: base, attr, .. }) = target {
                    if is_name(base, self_name) {
                        let resolved = evaluator.type_from_annotation(annotation, scope);
                        on_attr(attr.as_str(), &resolved, target.range());
                    }
                }
            }
            Stmt::If(ast::StmtIf {
                body,
                elif_else_clauses,
                ..
            }) => {
                walk_self_assignments(body, self_name, evaluator, scope, &mut on_attr);
                for clause in elif_else_clauses {
                    walk_self_assignments(&clause.body, self_name, evaluator, scope, &mut on_attr);
                }
            }
            Stmt::For(ast::StmtFor { body, orelse, .. })
            | Stmt::While(ast::StmtWhile { body, orelse, .. }) => {
                walk_self_assignments(body, self_name, evaluator, scope, &mut on_attr);
                walk_self_assignments(orelse, self_name, evaluator, scope, &mut on_attr);
            }
            Stmt::With(ast::StmtWith { body, .. }) => {
                walk_self_assignments(body, self_name, evaluator, scope, &mut on_attr)
            }
            Stmt::Try(ast::StmtTry {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            }) => {
                walk_self_assignments(body, self_name, evaluator, scope, &mut on_attr);
                for handler in handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    walk_self_assignments(&handler.body, self_name, evaluator, scope, &mut on_attr);
                }
                walk_self_assignments(orelse, self_name, evaluator, scope, &mut on_attr);
                walk_self_assignments(finalbody, self_name, evaluator, scope, &mut on_attr);
            }
            _ => {}
        }
    }
}

fn is_name(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Name(ast::ExprName { id, .. }) if id.as_str() == name)
}
