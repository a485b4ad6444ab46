//! End-to-end scenarios driving the full Parse → Collect → Evaluate pipeline
//! against small source fixtures, the scaled-down analogue of the teacher's
//! markdown-driven `mdtest` harness.

use halcyon_semantic::collaborators::{CollectingDiagnosticsSink, NoopModuleResolver, StaticHostInfo};
use halcyon_semantic::{
    AnalysisOptions, DiagnosticCode, ModuleHandle, Member, ModuleResolver, ModuleSession, Overload,
    Parameter, ParameterKind, PythonVersion, StubProvider,
};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> ruff_python_ast::ModModule {
    ruff_python_parser::parse_module(source)
        .expect("fixture source must parse")
        .into_syntax()
}

fn analyze(source: &str) -> (ModuleSession, CollectingDiagnosticsSink) {
    let module = parse(source);
    let options = AnalysisOptions::default();
    let host = StaticHostInfo::default();
    let resolver = NoopModuleResolver;
    let mut diagnostics = CollectingDiagnosticsSink::default();
    let session = ModuleSession::analyze(
        &module,
        &options,
        "scenario",
        PythonVersion::default(),
        &resolver,
        &resolver,
        &host,
        &mut diagnostics,
    )
    .expect("analysis must not hit an internal error");
    (session, diagnostics)
}

#[test]
fn forward_use_of_later_defined_method() {
    let (session, _diagnostics) = analyze(
        "class A:\n    def f(self):\n        return self.g()\n    def g(self):\n        return 1\n",
    );
    let a = session
        .lookup_module_level("A")
        .and_then(|m| m.as_type())
        .expect("A must be declared");
    let class = session.type_(a).as_class().expect("A is a class");

    // Both methods are visible in the class's member map regardless of
    // their relative evaluation order (spec.md §8, property 2's sibling
    // concern, and the "forward use" scenario's member-visibility half).
    let f = class.member("f").and_then(|m| m.as_type()).expect("f is a method");
    let g = class.member("g").and_then(|m| m.as_type()).expect("g is a method");

    let g_function = session.type_(g).as_function().expect("g is a function");
    let g_overload = g_function.overloads().into_iter().next().expect("g has one overload");
    assert_eq!(g_overload.return_values.len(), 1);
    assert_eq!(
        g_overload.return_values[0]
            .as_constant()
            .and_then(|c| c.as_bool()),
        Some(true),
        "g's own `return 1` resolves to a truthy int constant"
    );

    // `f` calls `g` before `g` is itself evaluated in registration order
    // (body order: `f` then `g`), so resolving `self.g()` while walking
    // `f`'s body forces `g`'s own evaluator to run in place (spec.md §4.E,
    // `evaluate(node)`) rather than leaving `f`'s return at `Unknown`.
    let f_function = session.type_(f).as_function().expect("f is a function");
    let f_overload = f_function.overloads().into_iter().next().expect("f has one overload");
    assert_eq!(f_overload.return_values.len(), 1);
    assert_eq!(
        f_overload.return_values[0]
            .as_constant()
            .and_then(|c| c.as_bool()),
        Some(true),
        "f's `return self.g()` resolves through the forced evaluation of g"
    );
}

#[test]
fn constructor_attribute_visible_regardless_of_method_order() {
    let (session, _diagnostics) = analyze(
        "class A:\n    def __init__(self):\n        self.x = 1\n    def y(self):\n        return self.x\n",
    );
    let a = session
        .lookup_module_level("A")
        .and_then(|m| m.as_type())
        .expect("A must be declared");
    let class = session.type_(a).as_class().expect("A is a class");

    let x = class.member("x").expect("constructor attribute x is visible");
    assert_eq!(x.as_constant().and_then(|c| c.as_bool()), Some(true));

    let y = class.member("y").and_then(|m| m.as_type()).expect("y is a method");
    let y_function = session.type_(y).as_function().expect("y is a function");
    let y_overload = y_function.overloads().into_iter().next().expect("y has one overload");
    assert_eq!(y_overload.return_values.len(), 1);
    assert!(
        matches!(y_overload.return_values[0], Member::Constant(_)),
        "self.x resolves through the class member map to the constructor's assigned constant"
    );
}

#[test]
fn generator_inference() {
    let (session, _diagnostics) = analyze("def g():\n    yield 1\n");
    let g = session
        .lookup_module_level("g")
        .and_then(|m| m.as_type())
        .expect("g must be declared");
    let function = session.type_(g).as_function().expect("g is a function");
    assert_eq!(function.overload_count(), 1);
    let overload = function.overloads().into_iter().next().unwrap();
    assert!(overload.is_generator);
    assert_eq!(overload.return_values.len(), 1);
}

#[test]
fn invalid_base_diagnostic() {
    let (session, diagnostics) = analyze("def f():\n    ...\nclass A(f):\n    ...\n");
    let a = session
        .lookup_module_level("A")
        .and_then(|m| m.as_type())
        .expect("A is still declared despite the invalid base");
    let class = session.type_(a).as_class().expect("A is a class");
    assert_eq!(class.bases(), Some(Vec::new()));

    let inherit_non_class: Vec<_> = diagnostics
        .0
        .iter()
        .filter(|d| d.code == DiagnosticCode::InheritNonClass)
        .collect();
    assert_eq!(inherit_non_class.len(), 1);
}

/// A [`StubProvider`] test double that declares exactly one stub overload,
/// for the "stub override" scenario (spec.md §4.D.2 / §8).
struct SingleStubProvider {
    path: Vec<String>,
    arity: usize,
}

impl ModuleResolver for SingleStubProvider {
    fn import(&self, _dotted_name: &str) -> Option<ModuleHandle> {
        None
    }

    fn importable_modules_by_name(&self, _name: &str, _include_implicit: bool) -> Vec<String> {
        Vec::new()
    }

    fn module_name_by_path(&self, _handle: ModuleHandle) -> Option<String> {
        None
    }
}

impl StubProvider for SingleStubProvider {
    fn lookup(&self, _module: ModuleHandle, _dotted_path: &[&str]) -> Option<Member> {
        None
    }

    fn has_stub(&self, _module: ModuleHandle) -> bool {
        true
    }

    fn own_stub_overload(&self, dotted_path: &[&str], positional_arity: usize) -> Option<Overload> {
        if dotted_path == self.path.iter().map(String::as_str).collect::<Vec<_>>().as_slice()
            && positional_arity == self.arity
        {
            let mut parameter = Parameter::new(ruff_python_ast::name::Name::new("x"), ParameterKind::PositionalOrKeyword);
            parameter.annotated_type = Some(Member::Constant(halcyon_semantic::types::Constant::int(0)));
            let mut overload = Overload::new().with_parameters(vec![parameter]);
            overload.set_authoritative_return(Member::Constant(halcyon_semantic::types::Constant::int(0)));
            Some(overload)
        } else {
            None
        }
    }
}

#[test]
fn stub_override_preserves_docs_and_skips_body() {
    let module = parse("def h(x):\n    \"docs\"\n    return x\n");
    let options = AnalysisOptions::default();
    let host = StaticHostInfo::default();
    let stubs = SingleStubProvider {
        path: vec!["h".to_string()],
        arity: 1,
    };
    let mut diagnostics = CollectingDiagnosticsSink::default();
    let session = ModuleSession::analyze(
        &module,
        &options,
        "scenario",
        PythonVersion::default(),
        &stubs,
        &stubs,
        &host,
        &mut diagnostics,
    )
    .expect("analysis must not hit an internal error");

    let h = session
        .lookup_module_level("h")
        .and_then(|m| m.as_type())
        .expect("h must be declared");
    let function = session.type_(h).as_function().expect("h is a function");
    assert_eq!(function.overload_count(), 1);
    let overload = function.overloads().into_iter().next().unwrap();
    assert_eq!(overload.parameters.len(), 1);
    assert!(overload.return_is_authoritative);
    assert_eq!(overload.documentation.as_deref(), Some("docs"));
}

#[test]
fn shadowed_annotation() {
    let (session, _diagnostics) = analyze("s = None\ndef f(s: s = 123):\n    ...\n");
    let f = session
        .lookup_module_level("f")
        .and_then(|m| m.as_type())
        .expect("f must be declared");
    let function = session.type_(f).as_function().expect("f is a function");
    let overload = function.overloads().into_iter().next().expect("f has one overload");
    let param = &overload.parameters[0];

    // The annotation `s` is evaluated against the scope the `def` lives in
    // (module scope), where `s = None` already shadows what would otherwise
    // be a builtin lookup — not against the function's own freshly-opened
    // body scope, where looking up `s` would instead see the very parameter
    // being declared (spec.md §4.F.2, step 4b).
    let resolved = param.resolved_type();
    match resolved {
        Member::Constant(constant) => {
            assert_eq!(constant.builtin_type, halcyon_semantic::types::BuiltinTypeId::NoneType);
        }
        other => panic!("expected the annotation to resolve to a None constant, got {other:?}"),
    }
}
