// ABOUTME: Field-level validation accumulator and the reusable predicates forms check against.
// ABOUTME: The first failure recorded for a field wins; later failures for that field are dropped.

use std::collections::HashMap;

/// Collects validation failures for a single form submission, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    field_errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field has a recorded error.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record `message` for `field` only when `ok` is false.
    pub fn check_field(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn field_errors(&self) -> &HashMap<String, String> {
        &self.field_errors
    }

    /// The message recorded for a single field, if any.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }
}

/// True if the value contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if the value has at most `limit` characters, counted as Unicode scalar values.
pub fn max_chars(value: &str, limit: usize) -> bool {
    value.chars().count() <= limit
}

/// True if `value` is one of `allowed`.
pub fn permitted_int<T: PartialEq>(value: T, allowed: &[T]) -> bool {
    allowed.contains(&value)
}
