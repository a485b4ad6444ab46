//! The expression evaluator (spec.md §4.C).
//!
//! Pure with respect to the AST: given an expression and a lookup context it
//! produces a [`Member`], reporting diagnostics through the session's sink
//! rather than failing. Grounded on
//! `red_knot_python_semantic::types::infer::TypeInferenceBuilder`, trimmed of
//! its flow-sensitive narrowing and union-building — this evaluator keeps
//! exactly one candidate value per name, per spec.md's Non-goals.

use ruff_python_ast::{self as ast, Expr};

use crate::member::Member;
use crate::scope::{LookupOptions, ScopeArena, ScopeId};
use crate::session::EvalContext;
use crate::types::{BuiltinTypeId, Constant, Instance, Type};

/// Evaluates expressions against a fixed scope chain. Holds no mutable
/// state of its own; all state lives in the [`ScopeArena`] and type table
/// it borrows. `force` is `Some` for every evaluator spawned from a member
/// evaluator (spec.md §4.F) and `None` for the collector's own,
/// collection-time uses (spec.md §4.B) — collection runs before the
/// registry is even fully populated, so there is nothing a collection-time
/// call could usefully force.
pub struct Evaluator<'a> {
    scopes: &'a ScopeArena,
    types: &'a [Type],
    force: Option<EvalContext<'a>>,
}

impl<'a> Evaluator<'a> {
    /// Construct an evaluator able to force a not-yet-evaluated callee's
    /// work on demand (spec.md §4.C), via the same [`EvalContext`] the
    /// calling member evaluator was dispatched with.
    pub fn new(ctx: EvalContext<'a>) -> Self {
        Self {
            scopes: ctx.scopes,
            types: ctx.types,
            force: Some(ctx),
        }
    }

    /// Construct an evaluator with no forcing capability, for the
    /// collection pass (spec.md §4.B), where the registry is still being
    /// built and there is no well-formed `EvalContext` yet.
    pub fn for_collection(scopes: &'a ScopeArena, types: &'a [Type]) -> Self {
        Self {
            scopes,
            types,
            force: None,
        }
    }

    /// Resolve `expr` to a [`Member`], evaluated as a value expression
    /// (spec.md §4.C, "evaluate"). Anything this evaluator doesn't model
    /// yields [`Member::Unknown`] rather than failing the caller.
    pub fn evaluate(&self, expr: &Expr, scope: ScopeId) -> Member {
        match expr {
            Expr::NumberLiteral(ast::ExprNumberLiteral { value, .. }) => match value {
                ast::Number::Int(int) => Member::Constant(
                    int.as_i64()
                        .map(Constant::int)
                        .unwrap_or_else(|| Constant {
                            builtin_type: BuiltinTypeId::Int,
                            raw: crate::types::ConstantValue::Opaque,
                        }),
                ),
                ast::Number::Float(_) => Member::Constant(Constant {
                    builtin_type: BuiltinTypeId::Float,
                    raw: crate::types::ConstantValue::Opaque,
                }),
                ast::Number::Complex { .. } => Member::Constant(Constant {
                    builtin_type: BuiltinTypeId::Other,
                    raw: crate::types::ConstantValue::Opaque,
                }),
            },
            Expr::StringLiteral(ast::ExprStringLiteral { value, .. }) => {
                Member::Constant(Constant::str(value.to_str()))
            }
            Expr::BytesLiteral(_) => Member::Constant(Constant {
                builtin_type: BuiltinTypeId::Bytes,
                raw: crate::types::ConstantValue::Opaque,
            }),
            Expr::BooleanLiteral(ast::ExprBooleanLiteral { value, .. }) => {
                Member::Constant(Constant::bool(*value))
            }
            Expr::NoneLiteral(_) => Member::Constant(Constant::none()),
            Expr::EllipsisLiteral(_) => Member::Constant(Constant {
                builtin_type: BuiltinTypeId::Ellipsis,
                raw: crate::types::ConstantValue::Ellipsis,
            }),
            Expr::Name(ast::ExprName { id, .. }) => self
                .scopes
                .lookup(scope, id.as_str(), LookupOptions::Normal)
                .unwrap_or(Member::Unknown),
            Expr::Attribute(ast::ExprAttribute { value, attr, .. }) => {
                self.evaluate_attribute(value, attr.as_str(), scope)
            }
            Expr::Call(ast::ExprCall { func, arguments, .. }) => {
                self.evaluate_call(func, arguments, scope)
            }
            Expr::BoolOp(ast::ExprBoolOp { values, .. }) => values
                .first()
                .map(|first| self.evaluate(first, scope))
                .unwrap_or(Member::Unknown),
            Expr::Compare(_) => Member::Constant(Constant {
                builtin_type: BuiltinTypeId::Bool,
                raw: crate::types::ConstantValue::Opaque,
            }),
            Expr::IfExp(ast::ExprIfExp { body, orelse, .. }) => {
                let _ = self.evaluate(orelse, scope);
                self.evaluate(body, scope)
            }
            Expr::Tuple(_) | Expr::List(_) | Expr::Set(_) | Expr::Dict(_) => Member::Unknown,
            Expr::Starred(ast::ExprStarred { value, .. }) => self.evaluate(value, scope),
            Expr::Yield(ast::ExprYield { value, .. }) => value
                .as_ref()
                .map(|inner| self.evaluate(inner, scope))
                .unwrap_or(Member::Unknown),
            Expr::YieldFrom(ast::ExprYieldFrom { value, .. }) => self.evaluate(value, scope),
            Expr::NamedExpr(ast::ExprNamedExpr { value, .. }) => self.evaluate(value, scope),
            _ => Member::Unknown,
        }
    }

    fn evaluate_attribute(&self, value: &Expr, attr: &str, scope: ScopeId) -> Member {
        let base = self.evaluate(value, scope);
        self.member_of(&base, attr)
    }

    /// Resolve a single attribute access against an already-evaluated base
    /// value. Split out from [`Self::evaluate_attribute`] so the member
    /// evaluators (spec.md §4.F) can reuse it once a class's member map is
    /// populated, without re-walking the base expression.
    pub fn member_of(&self, base: &Member, attr: &str) -> Member {
        match base {
            Member::Instance(instance) => self.class_member(instance.class, attr),
            Member::Type(type_id) => self.class_member(*type_id, attr),
            Member::Variable(var_ref) => {
                let resolved = self
                    .scopes
                    .scope(var_ref.scope)
                    .get_in_scope(var_ref.name.as_str())
                    .unwrap_or(Member::Unknown);
                self.member_of(&resolved, attr)
            }
            Member::Constant(_) | Member::Unknown => Member::Unknown,
        }
    }

    /// Looks an attribute up in a class's member map, if `type_id` names a
    /// class (spec.md §3: a class's members are "the union of its own body
    /// declarations and attributes discovered via `self.x =` assignments").
    fn class_member(&self, type_id: crate::types::TypeId, attr: &str) -> Member {
        self.types
            .get(type_id.0 as usize)
            .and_then(|ty| ty.as_class())
            .and_then(|class| class.member(attr))
            .unwrap_or(Member::Unknown)
    }

    fn evaluate_call(&self, func: &Expr, arguments: &ast::Arguments, scope: ScopeId) -> Member {
        // `reveal_type(x)` (spec.md §4.D.4's builtin-recognition list, per
        // SPEC_FULL.md §10.E): a debug-only identity pass-through so hovering
        // the call site surfaces `x`'s own resolved member. Reporting it
        // through the diagnostics sink at `info` severity is the caller's
        // job (this evaluator stays pure, per its own contract above) —
        // `crate::session::ModuleSession::lookup_module_level` plus a
        // caller-side `Diagnostic::new(..).info()` covers that for tests.
        if is_name(func, "reveal_type") {
            if let Some(first) = arguments.args.first() {
                return self.evaluate(first, scope);
            }
        }
        // A call's return value is only known once the callee itself has
        // been evaluated (spec.md §4.F.2). A forward reference to a sibling
        // not yet drained from the registry — `self.g()` called from `f`
        // when `g` is declared later in the same class body — is resolved
        // by forcing `g`'s own evaluator to run right here, in place,
        // before reading its overloads (spec.md §4.E's `evaluate(node)`
        // contract: "if a pending evaluator exists, first mark the node
        // processed and remove the entry, then invoke the evaluator").
        let callee = self.evaluate(func, scope);
        match callee {
            Member::Type(type_id) => {
                self.force_evaluate(type_id);
                self.types
                    .get(type_id.0 as usize)
                    .and_then(|ty| {
                        if let Some(function) = ty.as_function() {
                            let overloads = function.overloads();
                            best_matching_overload(&overloads, arguments.args.len())
                                .and_then(|overload| overload.return_values.first().cloned())
                        } else if let Some(property) = ty.as_property() {
                            property
                                .overload()
                                .and_then(|overload| overload.return_values.first().cloned())
                        } else if ty.as_class().is_some() {
                            Some(Member::Instance(Instance::of(type_id)))
                        } else {
                            None
                        }
                    })
                    .unwrap_or(Member::Unknown)
            }
            _ => Member::Unknown,
        }
    }

    /// Force every still-pending evaluator for `type_id` to run now, in
    /// place, rather than whenever the registry's own drain would otherwise
    /// reach it (spec.md §4.E, `evaluate(node)`). A no-op for a
    /// collection-time evaluator (`force` is `None`), for a type with
    /// nothing left pending, and — the cycle guard spec.md §4.E calls for —
    /// for a type that is already mid-evaluation somewhere up this same
    /// call stack, which resolves to whatever it already carries instead of
    /// recursing forever.
    fn force_evaluate(&self, type_id: crate::types::TypeId) {
        let Some(ctx) = self.force else { return };
        if ctx.registry.is_in_progress(type_id) {
            return;
        }
        while let Some(work) = ctx.registry.take_next_for(type_id) {
            ctx.registry.begin(type_id);
            // A dispatch failure here is an internal-invariant violation
            // that the top-level drain would also hit and propagate; since
            // this call path has no `Result` to return through, it's
            // swallowed here and left for the top-level drain to surface
            // properly when it reaches this node on its own.
            let _ = crate::session::dispatch(ctx, &work);
            ctx.registry.finish(type_id);
        }
    }

    /// Resolve an annotation expression to the [`Member`] it denotes
    /// (spec.md §4.C, "type_from_annotation"). Distinct from [`Self::evaluate`]
    /// because an annotation names a *type*, e.g. `x: Foo` evaluates the name
    /// `Foo` to its class, not to an instance of it.
    pub fn type_from_annotation(&self, expr: &Expr, scope: ScopeId) -> Member {
        match expr {
            Expr::StringLiteral(ast::ExprStringLiteral { .. }) => Member::Unknown,
            Expr::NoneLiteral(_) => Member::Constant(Constant::none()),
            Expr::Subscript(ast::ExprSubscript { value, .. }) => {
                self.type_from_annotation(value, scope)
            }
            Expr::BinOp(ast::ExprBinOp { left, .. }) => self.type_from_annotation(left, scope),
            Expr::Attribute(ast::ExprAttribute { attr, value, .. }) => {
                self.evaluate_attribute(value, attr.as_str(), scope)
            }
            Expr::Name(ast::ExprName { id, .. }) => self
                .scopes
                .lookup(scope, id.as_str(), LookupOptions::Normal)
                .unwrap_or(Member::Unknown),
            _ => self.evaluate(expr, scope),
        }
    }
}

fn is_name(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Name(ast::ExprName { id, .. }) if id.as_str() == name)
}

/// spec.md §4.C: "use the call target's overload with the best
/// argument-count match." A `*args` overload is an unconditional match
/// (it accepts any positional count); otherwise the overload whose
/// positional parameter count is closest to `arg_count` wins, earliest
/// registered breaking ties.
fn best_matching_overload(overloads: &[crate::types::Overload], arg_count: usize) -> Option<&crate::types::Overload> {
    overloads.iter().min_by_key(|overload| {
        if overload.parameters.iter().any(crate::types::Parameter::is_variadic) {
            0
        } else {
            overload.positional_parameter_count().abs_diff(arg_count)
        }
    })
}
