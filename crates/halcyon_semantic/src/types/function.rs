//! Overload and parameter representation (spec.md §3, "Function type").

use ruff_python_ast::name::Name;

use crate::member::Member;

/// One callable signature of a function (spec.md §3: "Each overload holds:
/// parameter list ..., declared return annotation string ..., resolved
/// return value(s) ..., and documentation").
#[derive(Debug, Clone)]
pub struct Overload {
    pub parameters: Vec<Parameter>,
    /// The annotation as written, kept only for display (spec.md §3).
    pub declared_return_annotation: Option<String>,
    /// The resolved return value(s). A `Vec` because a function with no
    /// annotation can return a union of everything its `return` statements
    /// produced (spec.md §4.F.2, step 3).
    pub return_values: Vec<Member>,
    /// Whether `return_values` came from an explicit annotation (spec.md
    /// §4.F.2, step 3: "marking it as annotation-derived (authoritative)").
    /// Authoritative return values are not widened by further `return`
    /// statements found while walking the body.
    pub return_is_authoritative: bool,
    pub documentation: Option<String>,
    /// Set for functions whose body contains a top-level `yield`; the
    /// overload's single return value is then the generator's yielded type,
    /// not a list of `return` values (spec.md §4.F.2, step 3).
    pub is_generator: bool,
}

impl Overload {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            declared_return_annotation: None,
            return_values: Vec::new(),
            return_is_authoritative: false,
            documentation: None,
            is_generator: false,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_documentation(mut self, documentation: Option<String>) -> Self {
        self.documentation = documentation;
        self
    }

    /// Add to the return set, respecting authoritativeness (spec.md
    /// §4.F.2, step 5: "add `expr`'s value to the overload's return set").
    pub fn add_return_value(&mut self, value: Member) {
        if self.return_is_authoritative {
            return;
        }
        self.return_values.push(value);
    }

    pub fn set_authoritative_return(&mut self, value: Member) {
        self.return_values = vec![value];
        self.return_is_authoritative = true;
    }

    pub fn positional_parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| {
                matches!(
                    p.kind,
                    ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword
                )
            })
            .count()
    }
}

impl Default for Overload {
    fn default() -> Self {
        Self::new()
    }
}

/// One parameter of an [`Overload`] (spec.md §3: "name, annotated type,
/// default-value type, is-variadic, is-kw-dict").
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Name,
    pub annotated_type: Option<Member>,
    pub default_value_type: Option<Member>,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: Name, kind: ParameterKind) -> Self {
        Self {
            name,
            annotated_type: None,
            default_value_type: None,
            kind,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ParameterKind::Variadic)
    }

    pub fn is_kw_dict(&self) -> bool {
        matches!(self.kind, ParameterKind::KeywordDict)
    }

    /// The type an evaluator should attribute to a reference to this
    /// parameter inside the function body: the annotation if present,
    /// otherwise the default value's type, otherwise `Unknown`.
    pub fn resolved_type(&self) -> Member {
        self.annotated_type
            .clone()
            .or_else(|| self.default_value_type.clone())
            .unwrap_or(Member::Unknown)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    /// `*args`.
    Variadic,
    KeywordOnly,
    /// `**kwargs`.
    KeywordDict,
}
