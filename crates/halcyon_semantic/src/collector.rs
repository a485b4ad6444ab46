//! The symbol collector (spec.md §4.D).
//!
//! A single forward walk over the module body that creates a [`Type`] for
//! every class/function/property it finds, opens the scope each belongs to,
//! declares it in its enclosing scope, and queues follow-up work with the
//! [`Registry`] — it never resolves a base class, a return type, or an
//! annotation itself; that happens later, in [`crate::member_evaluators`].
//! Grounded on `red_knot_python_semantic::semantic_index::builder`'s
//! `SemanticIndexBuilder`, with its use-def/narrowing bookkeeping removed
//! (spec.md Non-goals: no flow-sensitive narrowing).

use std::collections::HashMap;

use ruff_python_ast::name::Name;
use ruff_python_ast::{self as ast};
use ruff_text_size::Ranged;

use crate::collaborators::{HostInfo, Location, ModuleResolver, StubProvider};
use crate::config::AnalysisOptions;
use crate::evaluator::Evaluator;
use crate::member::{Member, VariableSource};
use crate::node_key::NodeKey;
use crate::python_version::{PythonVersion, VersionCmpOp};
use crate::registry::{Registry, WorkKind};
use crate::scope::{ScopeArena, ScopeId, ScopeKind};
use crate::types::{ClassType, DeclaringModule, FunctionType, PropertyType, Type, TypeId, TypeKind};

/// Where to find the AST node a [`crate::registry::PendingWork`] item refers
/// to: the collector builds this table once, and the evaluation driver in
/// [`crate::session`] consults it rather than re-walking the tree to find a
/// node by [`NodeKey`].
pub enum NodeRef<'ast> {
    Function(&'ast ast::StmtFunctionDef),
    Class(&'ast ast::StmtClassDef),
}

/// Owns every arena and side-table the collector builds; handed to
/// [`crate::session::ModuleSession::analyze`] once collection finishes.
pub struct CollectedModule<'ast> {
    pub types: Vec<Type>,
    pub scopes: ScopeArena,
    pub registry: Registry,
    pub module_scope: ScopeId,
    pub nodes: HashMap<NodeKey, NodeRef<'ast>>,
    pub node_scopes: HashMap<NodeKey, ScopeId>,
    pub explicit_exports: Option<Vec<Name>>,
}

struct TypeTable {
    types: Vec<Type>,
}

impl TypeTable {
    fn new() -> Self {
        Self { types: Vec::new() }
    }

    fn alloc(&mut self, build: impl FnOnce(TypeId) -> Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(build(id));
        id
    }
}

pub struct Collector<'ast, 'r> {
    types: TypeTable,
    scopes: ScopeArena,
    registry: Registry,
    nodes: HashMap<NodeKey, NodeRef<'ast>>,
    node_scopes: HashMap<NodeKey, ScopeId>,
    explicit_exports: Option<Vec<Name>>,
    options: &'r AnalysisOptions,
    python_version: PythonVersion,
    host: &'r dyn HostInfo,
    depth: usize,
    #[allow(dead_code)] // import resolution is a ModuleResolver-level concern (see DESIGN.md).
    resolver: &'r dyn ModuleResolver,
    // The stub-override rule itself (spec.md §4.D.2) is applied later, by
    // the function evaluator against `EvalContext::stubs` — the collector
    // only needs to know a stub provider exists, not consult it directly.
    #[allow(dead_code)]
    stubs: &'r dyn StubProvider,
}

impl<'ast, 'r> Collector<'ast, 'r> {
    pub fn new(
        options: &'r AnalysisOptions,
        python_version: PythonVersion,
        resolver: &'r dyn ModuleResolver,
        stubs: &'r dyn StubProvider,
        host: &'r dyn HostInfo,
    ) -> Self {
        Self {
            types: TypeTable::new(),
            scopes: ScopeArena::new(),
            registry: Registry::new(),
            nodes: HashMap::new(),
            node_scopes: HashMap::new(),
            explicit_exports: None,
            options,
            python_version,
            host,
            depth: 0,
            resolver,
            stubs,
        }
    }

    /// Bounds how deep class/function nesting is walked (spec.md §7:
    /// `max_nesting_depth` guards against pathological or generated source
    /// blowing the collector's recursive descent). Nesting beyond the limit
    /// is simply not descended into; already-collected outer symbols are
    /// unaffected.
    fn within_depth_budget(&self) -> bool {
        self.depth < self.options.max_nesting_depth
    }

    /// Walk the whole module and return everything collected (spec.md
    /// §4.D).
    pub fn collect(mut self, module: &'ast ast::ModModule) -> CollectedModule<'ast> {
        let module_scope = self.scopes.module_scope();
        self.collect_body(&module.body, module_scope, &[], None);
        CollectedModule {
            types: self.types.types,
            scopes: self.scopes,
            registry: self.registry,
            module_scope,
            nodes: self.nodes,
            node_scopes: self.node_scopes,
            explicit_exports: self.explicit_exports,
        }
    }

    fn collect_body(
        &mut self,
        body: &'ast [ast::Stmt],
        scope: ScopeId,
        path: &[Name],
        declaring_type: Option<TypeId>,
    ) {
        for stmt in body {
            self.collect_stmt(stmt, scope, path, declaring_type);
        }
    }

    fn collect_stmt(
        &mut self,
        stmt: &'ast ast::Stmt,
        scope: ScopeId,
        path: &[Name],
        declaring_type: Option<TypeId>,
    ) {
        match stmt {
            ast::Stmt::ClassDef(class_def) => {
                self.collect_class(class_def, scope, path, declaring_type)
            }
            ast::Stmt::FunctionDef(func_def) => {
                self.collect_function(func_def, scope, path, declaring_type)
            }
            ast::Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
                self.collect_assign_targets(targets, value, scope)
            }
            ast::Stmt::AnnAssign(ast::StmtAnnAssign {
                target,
                annotation,
                value,
                ..
            }) => self.collect_ann_assign(target, annotation, value.as_deref(), scope),
            ast::Stmt::Import(ast::StmtImport { names, .. }) => {
                self.collect_import_names(names, scope)
            }
            ast::Stmt::ImportFrom(ast::StmtImportFrom { names, .. }) => {
                self.collect_import_names(names, scope)
            }
            // spec.md §4.D.3: a top-level `if` guarding definitions behind a
            // `sys.version_info`/`sys.platform` check is pruned to the
            // branch this core's configured python_version satisfies;
            // anything else walks every branch (no flow-sensitive
            // narrowing, per Non-goals — last declaration simply wins).
            ast::Stmt::If(stmt_if) => self.collect_if(stmt_if, scope, path, declaring_type),
            ast::Stmt::Try(ast::StmtTry {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            }) => {
                self.collect_body(body, scope, path, declaring_type);
                for handler in handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.collect_body(&handler.body, scope, path, declaring_type);
                }
                self.collect_body(orelse, scope, path, declaring_type);
                self.collect_body(finalbody, scope, path, declaring_type);
            }
            ast::Stmt::With(ast::StmtWith { body, .. }) => {
                self.collect_body(body, scope, path, declaring_type)
            }
            ast::Stmt::For(ast::StmtFor { body, orelse, .. }) => {
                self.collect_body(body, scope, path, declaring_type);
                self.collect_body(orelse, scope, path, declaring_type);
            }
            ast::Stmt::While(ast::StmtWhile { body, orelse, .. }) => {
                self.collect_body(body, scope, path, declaring_type);
                self.collect_body(orelse, scope, path, declaring_type);
            }
            _ => {}
        }
    }

    fn collect_if(
        &mut self,
        stmt_if: &'ast ast::StmtIf,
        scope: ScopeId,
        path: &[Name],
        declaring_type: Option<TypeId>,
    ) {
        if let Some(decision) = system_predicate_decision(&stmt_if.test, self.python_version, self.host) {
            if decision {
                self.collect_body(&stmt_if.body, scope, path, declaring_type);
            } else {
                for clause in &stmt_if.elif_else_clauses {
                    self.collect_body(&clause.body, scope, path, declaring_type);
                }
            }
            return;
        }
        self.collect_body(&stmt_if.body, scope, path, declaring_type);
        for clause in &stmt_if.elif_else_clauses {
            self.collect_body(&clause.body, scope, path, declaring_type);
        }
    }

    fn collect_assign_targets(
        &mut self,
        targets: &'ast [ast::Expr],
        value: &'ast ast::Expr,
        scope: ScopeId,
    ) {
        for target in targets {
            if let ast::Expr::Name(ast::ExprName { id, .. }) = target {
                if id.as_str() == "__all__" {
                    self.explicit_exports = evaluate_all_literal(value);
                }
                let evaluated = Evaluator::for_collection(&self.scopes, &self.types.types).evaluate(value, scope);
                let scope_ref = self.scopes.scope(scope);
                scope_ref.declare(id.clone(), evaluated, VariableSource::Assignment);
                // spec.md §4.A, "Key rule": a user-declared assignment's
                // reference locations live on the `Variable`, not the `Type`.
                scope_ref.record_location(id.as_str(), Location::new(target.range()));
            }
            // Attribute targets (`self.x = ...`) are a member-evaluator
            // concern (spec.md §4.F.2, constructor attribute discovery),
            // not the collector's: the collector only owns scope-level
            // names.
        }
    }

    fn collect_ann_assign(
        &mut self,
        target: &'ast ast::Expr,
        annotation: &'ast ast::Expr,
        value: Option<&'ast ast::Expr>,
        scope: ScopeId,
    ) {
        let ast::Expr::Name(ast::ExprName { id, .. }) = target else {
            return;
        };
        let evaluator = Evaluator::for_collection(&self.scopes, &self.types.types);
        let declared = evaluator.type_from_annotation(annotation, scope);
        let resolved = if declared.is_unknown() {
            value
                .map(|v| evaluator.evaluate(v, scope))
                .unwrap_or(Member::Unknown)
        } else {
            declared
        };
        let scope_ref = self.scopes.scope(scope);
        scope_ref.declare(id.clone(), resolved, VariableSource::Declaration);
        scope_ref.record_location(id.as_str(), Location::new(target.range()));
    }

    fn collect_import_names(&mut self, names: &'ast [ast::Alias], scope: ScopeId) {
        for alias in names {
            let bound = alias
                .asname
                .as_ref()
                .map(ast::Identifier::as_str)
                .unwrap_or_else(|| alias.name.as_str());
            // Full resolution belongs to the host's `ModuleResolver`
            // (spec.md: an external collaborator); this core only reserves
            // the name so later lookups don't treat it as undefined.
            self.scopes.scope(scope).declare(
                Name::new(bound),
                Member::Unknown,
                VariableSource::Import,
            );
        }
    }

    fn collect_class(
        &mut self,
        class_def: &'ast ast::StmtClassDef,
        scope: ScopeId,
        path: &[Name],
        _enclosing_type: Option<TypeId>,
    ) {
        let node_key = NodeKey::from_node(class_def);
        let name = Name::new(class_def.name.as_str());
        let mut qualified_path = path.to_vec();
        qualified_path.push(name.clone());

        let type_id = self.types.alloc(|id| {
            Type::new(
                id,
                name.clone(),
                DeclaringModule::Current,
                qualified_path.clone(),
                TypeKind::Class(ClassType::new(node_key)),
            )
        });
        attach_docstring(&self.types.types[type_id.0 as usize], &class_def.body);

        self.scopes
            .scope(scope)
            .declare(name, Member::Type(type_id), VariableSource::Declaration);

        let class_scope = self.scopes.open(ScopeKind::Class, scope, node_key);
        self.node_scopes.insert(node_key, class_scope);
        self.nodes.insert(node_key, NodeRef::Class(class_def));
        // Registered before descending into the body, so the class's own
        // evaluation (and its member-map copy-in, spec.md §4.F.1 step 3)
        // runs before its methods' bodies are evaluated — a method
        // referencing a sibling by name (`self.other_method()`) can then
        // find that sibling's `Type` in the class's member map even on a
        // forward reference, since collection (which declares every name)
        // always completes before any evaluation begins.
        self.registry
            .add(type_id, node_key, WorkKind::Class, self.scopes.scope(scope).origin());

        if self.within_depth_budget() {
            self.depth += 1;
            self.collect_body(&class_def.body, class_scope, &qualified_path, Some(type_id));
            self.depth -= 1;
        }
    }

    fn collect_function(
        &mut self,
        func_def: &'ast ast::StmtFunctionDef,
        scope: ScopeId,
        path: &[Name],
        declaring_type: Option<TypeId>,
    ) {
        let node_key = NodeKey::from_node(func_def);
        let name = Name::new(func_def.name.as_str());
        let mut qualified_path = path.to_vec();
        qualified_path.push(name.clone());

        let decorators: Vec<&str> = func_def
            .decorator_list
            .iter()
            .filter_map(decorator_name)
            .collect();

        // spec.md §4.D.5: a `@deprecated`-decorated definition is still
        // declared (so references to it resolve) but is never queued for
        // evaluation, so its overload set stays empty and its return stays
        // `Unknown` rather than being refined.
        let is_deprecated = decorators.iter().any(|d| *d == "deprecated");
        let is_property_getter = decorators.iter().any(|d| *d == "property");
        let is_property_accessor = decorators
            .iter()
            .any(|d| d.ends_with(".setter") || d.ends_with(".deleter"));
        let is_abstract = decorators
            .iter()
            .any(|d| *d == "abstractmethod" || d.ends_with(".abstractmethod"));
        let is_static = decorators.iter().any(|d| *d == "staticmethod");
        let is_class_method = decorators.iter().any(|d| *d == "classmethod");

        if is_property_accessor {
            // A `@x.setter`/`@x.deleter` redeclaration shares its sibling
            // getter's `Type`; the function evaluator attaches its overload
            // to that existing property rather than creating a new one
            // (spec.md §4.F.3).
            if let Some(existing) = self
                .scopes
                .scope(scope)
                .get_in_scope(name.as_str())
                .and_then(|m| m.as_type())
            {
                self.nodes.insert(node_key, NodeRef::Function(func_def));
                if !is_deprecated {
                    self.registry.add(
                        existing,
                        node_key,
                        WorkKind::Property,
                        self.scopes.scope(scope).origin(),
                    );
                }
                return;
            }
        }

        // spec.md §4.D step 2: "If a function with the same name already
        // exists in the local scope, append an overload to it; otherwise
        // create a new function type and declare it." A non-accessor
        // redefinition (e.g. a repeated `@overload`-decorated `def`) reuses
        // the existing `FunctionType` rather than allocating a fresh one
        // that would shadow it in the scope and never be reachable again.
        let existing_function = if is_property_getter {
            None
        } else {
            self.scopes
                .scope(scope)
                .get_in_scope(name.as_str())
                .and_then(|m| m.as_type())
                .filter(|id| self.types.types[id.0 as usize].as_function().is_some())
        };

        let type_id = if let Some(existing) = existing_function {
            existing
        } else {
            let kind = if is_property_getter {
                let mut property = PropertyType::new(declaring_type);
                property.is_static = is_static;
                property.is_class_method = is_class_method;
                TypeKind::Property(property)
            } else {
                let mut function = FunctionType::new(declaring_type);
                function.is_static = is_static;
                function.is_class_method = is_class_method;
                TypeKind::Function(function)
            };

            let id = self.types.alloc(|id| {
                Type::new(
                    id,
                    name.clone(),
                    DeclaringModule::Current,
                    qualified_path.clone(),
                    kind,
                )
            });
            self.scopes.scope(scope).declare(
                name,
                Member::Type(id),
                VariableSource::Declaration,
            );
            id
        };

        attach_docstring(&self.types.types[type_id.0 as usize], &func_def.body);
        if is_property_getter {
            if let TypeKind::Property(property) = self.types.types[type_id.0 as usize].kind() {
                property.set_abstract(is_abstract);
            }
        }

        let function_scope = self.scopes.open(ScopeKind::Function, scope, node_key);
        self.node_scopes.insert(node_key, function_scope);
        self.nodes.insert(node_key, NodeRef::Function(func_def));

        let work_kind = if is_property_getter {
            WorkKind::Property
        } else {
            WorkKind::Function
        };
        if !is_deprecated {
            self.registry
                .add(type_id, node_key, work_kind, self.scopes.scope(scope).origin());
        }

        // Nested definitions (closures, local classes) still need their own
        // scopes and types even though the parent function itself may be
        // skipped for evaluation.
        if self.within_depth_budget() {
            self.depth += 1;
            self.collect_body(&func_def.body, function_scope, &qualified_path, None);
            self.depth -= 1;
        }
    }
}

fn attach_docstring(ty: &Type, body: &[ast::Stmt]) {
    if let Some(ast::Stmt::Expr(ast::StmtExpr { value, .. })) = body.first() {
        if let ast::Expr::StringLiteral(ast::ExprStringLiteral { value: s, .. }) = value.as_ref() {
            ty.set_documentation(Some(s.to_str().to_string()));
        }
    }
}

fn decorator_name(decorator: &ast::Decorator) -> Option<&str> {
    match &decorator.expression {
        ast::Expr::Name(ast::ExprName { id, .. }) => Some(id.as_str()),
        ast::Expr::Attribute(ast::ExprAttribute { attr, .. }) => Some(attr.as_str()),
        ast::Expr::Call(ast::ExprCall { func, .. }) => decorator_name_of_expr(func),
        _ => None,
    }
}

fn decorator_name_of_expr(expr: &ast::Expr) -> Option<&str> {
    match expr {
        ast::Expr::Name(ast::ExprName { id, .. }) => Some(id.as_str()),
        ast::Expr::Attribute(ast::ExprAttribute { attr, .. }) => Some(attr.as_str()),
        _ => None,
    }
}

/// Recognizes the four system predicates spec.md §4.D.3 names — "For every
/// `if sys.version_info op (M,N): A else: B`..." plus `sys.platform`,
/// `os.path._names`, and `sys.byteorder` — and returns whether the branch it
/// guards is taken for this analysis's [`HostInfo`]/[`PythonVersion`]. Any
/// other condition shape returns `None`, meaning "not a system predicate";
/// the caller then walks every branch rather than pruning.
fn system_predicate_decision(
    test: &ast::Expr,
    python_version: PythonVersion,
    host: &dyn HostInfo,
) -> Option<bool> {
    if let ast::Expr::Compare(ast::ExprCompare {
        left,
        ops,
        comparators,
        ..
    }) = test
    {
        if ops.len() != 1 || comparators.len() != 1 {
            return None;
        }
        if is_attr_named(left, "version_info") {
            let op = version_cmp_op(ops[0])?;
            let tuple = tuple_of_ints(&comparators[0])?;
            return python_version.compare_tuple(op, tuple);
        }
        if is_attr_named(left, "platform") {
            let other = string_literal(&comparators[0])?;
            return equality_decision(ops[0], host.platform_name() == other);
        }
        if is_attr_named(left, "byteorder") {
            let other = string_literal(&comparators[0])?;
            let is_little = host.is_little_endian();
            let matches = (other == "little" && is_little) || (other == "big" && !is_little);
            return equality_decision(ops[0], matches);
        }
        // `"posix" in os.path._names` / `"nt" in os.path._names`, CPython's
        // own idiom for selecting between `posixpath`/`ntpath`.
        if is_attr_path_named(&comparators[0], &["os", "path", "_names"]) {
            let name = string_literal(left)?;
            let matches = (name == "posix" && !host.is_windows()) || (name == "nt" && host.is_windows());
            return membership_decision(ops[0], matches);
        }
        return None;
    }
    None
}

fn version_cmp_op(op: ast::CmpOp) -> Option<VersionCmpOp> {
    match op {
        ast::CmpOp::Lt => Some(VersionCmpOp::Lt),
        ast::CmpOp::LtE => Some(VersionCmpOp::LtE),
        ast::CmpOp::Gt => Some(VersionCmpOp::Gt),
        ast::CmpOp::GtE => Some(VersionCmpOp::GtE),
        ast::CmpOp::Eq => Some(VersionCmpOp::Eq),
        ast::CmpOp::NotEq => Some(VersionCmpOp::NotEq),
        _ => None,
    }
}

/// `op` applied to an already-computed equality test (`sys.platform == "..."`
/// style predicates only ever compare with `==`/`!=`).
fn equality_decision(op: ast::CmpOp, equal: bool) -> Option<bool> {
    match op {
        ast::CmpOp::Eq => Some(equal),
        ast::CmpOp::NotEq => Some(!equal),
        _ => None,
    }
}

/// `op` applied to an already-computed membership test (`"posix" in
/// os.path._names` style predicates only ever compare with `in`/`not in`).
fn membership_decision(op: ast::CmpOp, contained: bool) -> Option<bool> {
    match op {
        ast::CmpOp::In => Some(contained),
        ast::CmpOp::NotIn => Some(!contained),
        _ => None,
    }
}

fn is_attr_named(expr: &ast::Expr, attr_name: &str) -> bool {
    matches!(
        expr,
        ast::Expr::Attribute(ast::ExprAttribute { attr, .. }) if attr.as_str() == attr_name
    )
}

/// Whether `expr` is the dotted attribute chain `segments` (e.g.
/// `["os", "path", "_names"]` for `os.path._names`), read outside-in.
fn is_attr_path_named(expr: &ast::Expr, segments: &[&str]) -> bool {
    let Some((last, rest)) = segments.split_last() else {
        return false;
    };
    let ast::Expr::Attribute(ast::ExprAttribute { attr, value, .. }) = expr else {
        return false;
    };
    if attr.as_str() != *last {
        return false;
    }
    if rest.is_empty() {
        return matches!(value.as_ref(), ast::Expr::Name(_));
    }
    if rest.len() == 1 {
        return matches!(value.as_ref(), ast::Expr::Name(ast::ExprName { id, .. }) if id.as_str() == rest[0]);
    }
    is_attr_path_named(value, rest)
}

fn string_literal(expr: &ast::Expr) -> Option<&str> {
    match expr {
        ast::Expr::StringLiteral(ast::ExprStringLiteral { value, .. }) => Some(value.to_str()),
        _ => None,
    }
}

fn tuple_of_ints(expr: &ast::Expr) -> Option<(u8, u8)> {
    let ast::Expr::Tuple(ast::ExprTuple { elts, .. }) = expr else {
        return None;
    };
    let mut values = elts.iter().filter_map(|e| match e {
        ast::Expr::NumberLiteral(ast::ExprNumberLiteral {
            value: ast::Number::Int(i),
            ..
        }) => i.as_i64().map(|v| v as u8),
        _ => None,
    });
    let major = values.next()?;
    let minor = values.next().unwrap_or(0);
    Some((major, minor))
}

/// `__all__ = ["a", "b"]` (and the `("a", "b")` / `+=`-free tuple form).
/// Anything more dynamic is left for [`crate::member_evaluators::evaluate_module`]
/// to fall back on "every public name" for (spec.md §4.F.4).
fn evaluate_all_literal(value: &ast::Expr) -> Option<Vec<Name>> {
    let elts = match value {
        ast::Expr::List(ast::ExprList { elts, .. }) => elts,
        ast::Expr::Tuple(ast::ExprTuple { elts, .. }) => elts,
        _ => return None,
    };
    let mut names = Vec::with_capacity(elts.len());
    for elt in elts {
        match elt {
            ast::Expr::StringLiteral(ast::ExprStringLiteral { value, .. }) => {
                names.push(Name::new(value.to_str()));
            }
            _ => return None,
        }
    }
    Some(names)
}
