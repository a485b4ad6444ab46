//! Member evaluators (spec.md §4.F): the closures the collector registers
//! with the [`crate::registry::Registry`] to finish resolving a class,
//! function, property, or module once collection has discovered it.
//!
//! Grounded on `red_knot_python_semantic::types::infer`'s per-definition
//! inference functions (`infer_function_body`, `infer_class_body`, ...),
//! but running eagerly to completion rather than as Salsa queries — spec.md
//! "Design Notes" replaces the query cache with the registry's
//! pending/processed bookkeeping, so these functions just need to be
//! idempotent, not memoized.

mod class_eval;
mod function_eval;
mod module_eval;
mod property_eval;

pub use class_eval::evaluate_class;
pub use function_eval::evaluate_function;
pub use module_eval::evaluate_module;
pub use property_eval::evaluate_property;
