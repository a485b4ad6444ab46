//! Property type representation (spec.md §3, "Property type").

use std::sync::Mutex;

use super::{Overload, TypeId};

/// "Like a function but with exactly one 'overload' and an `is_abstract`
/// flag" (spec.md §3).
pub struct PropertyType {
    pub declaring_type: Option<TypeId>,
    /// Whether the getter carried `@staticmethod` (spec.md §4.F.3: "an
    /// unabstract property must not carry `staticmethod` or `classmethod`").
    pub is_static: bool,
    /// Whether the getter carried `@classmethod`, same rule as `is_static`.
    pub is_class_method: bool,
    overload: Mutex<Option<Overload>>,
    is_abstract: Mutex<bool>,
}

impl PropertyType {
    pub fn new(declaring_type: Option<TypeId>) -> Self {
        Self {
            declaring_type,
            is_static: false,
            is_class_method: false,
            overload: Mutex::new(None),
            is_abstract: Mutex::new(false),
        }
    }

    pub fn set_overload(&self, overload: Overload) {
        *self.overload.lock().unwrap() = Some(overload);
    }

    pub fn overload(&self) -> Option<Overload> {
        self.overload.lock().unwrap().clone()
    }

    pub fn set_abstract(&self, is_abstract: bool) {
        *self.is_abstract.lock().unwrap() = is_abstract;
    }

    pub fn is_abstract(&self) -> bool {
        *self.is_abstract.lock().unwrap()
    }
}

impl Default for PropertyType {
    fn default() -> Self {
        Self::new(None)
    }
}
