//! Diagnostic codes and entries this core can emit.
//!
//! Grounded on `red_knot_python_semantic::types::diagnostic` (a
//! `declare_lint!`-per-condition registry), trimmed to the fixed set of six
//! stable codes spec.md §6 actually names — this core is not an extensible
//! lint framework, it is a handful of structural checks that happen during
//! collection and evaluation.

use std::fmt;

use ruff_text_size::TextRange;

/// Stable diagnostic codes recognised by this core (spec.md §6).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, strum::Display)]
pub enum DiagnosticCode {
    InheritNonClass,
    NoSelfArgument,
    NoClsArgument,
    NoMethodArgument,
    ReturnInInit,
    InvalidDecoratorCombination,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl DiagnosticCode {
    /// The severity prescribed for this code when not otherwise configured.
    ///
    /// Matches the error/warning split called out in spec.md §7: malformed
    /// references that fully invalidate a member (`InheritNonClass`, the
    /// missing-first-parameter codes) are errors; advisory-only findings
    /// (`ReturnInInit`, decorator combinations the evaluator still recovers
    /// from) are warnings.
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::InheritNonClass
            | DiagnosticCode::NoSelfArgument
            | DiagnosticCode::NoClsArgument
            | DiagnosticCode::NoMethodArgument => Severity::Error,
            DiagnosticCode::ReturnInInit | DiagnosticCode::InvalidDecoratorCombination => {
                Severity::Warning
            }
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A single diagnostic record, as handed to a [`crate::DiagnosticsSink`]
/// (spec.md §6: `{ message, span, code, severity, source }`).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub span: TextRange,
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Fixed identifier of the component that raised this diagnostic,
    /// e.g. `"collector"` or `"class-evaluator"`.
    pub source: &'static str,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        span: TextRange,
        source: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            span,
            code,
            severity: code.default_severity(),
            source,
        }
    }

    pub fn info(mut self) -> Self {
        self.severity = Severity::Info;
        self
    }
}
