// Best-effort type coercion
//
// Coercion never fails: whenever a conversion is not meaningful the input is
// handed back unchanged and validation decides.

use super::idl::PRIMITIVES;
use super::Contract;
use crate::contract::validate::is_integral;
use serde_json::{Number, Value};

/// Converts a value toward one of the primitive types
/// (`string`, `bool`, `int`, `float`). Only called for non-null values.
pub trait Coercer: Send + Sync {
    fn coerce(&self, expected: &str, value: Value) -> Value;
}

/// Default rules:
/// - bool / number → string
/// - `"true"` / `"false"` → bool
/// - numeric string → int / float, only when formatting the parsed number
///   reproduces the input exactly (so `" 1"`, `"01"`, `"1e3"` are left alone)
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCoercer;

impl Coercer for DefaultCoercer {
    fn coerce(&self, expected: &str, value: Value) -> Value {
        match value {
            Value::Bool(b) if expected == "string" => Value::String(b.to_string()),
            Value::Number(n) if expected == "string" => Value::String(number_to_string(&n)),
            Value::String(s) => match expected {
                "bool" => match s.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::String(s),
                },
                "int" => match s.parse::<i64>() {
                    Ok(n) if n.to_string() == s => Value::from(n),
                    _ => Value::String(s),
                },
                "float" => match s.parse::<f64>() {
                    Ok(f) if f.is_finite() && f.to_string() == s => Number::from_f64(f)
                        .map(Value::Number)
                        .unwrap_or(Value::String(s)),
                    _ => Value::String(s),
                },
                _ => Value::String(s),
            },
            other => other,
        }
    }
}

fn number_to_string(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        // 3.0 renders as "3", the way the number reads on the wire
        Some(f) if is_integral(n) && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl Contract {
    /// Coerce `value` toward `type_name`, descending into arrays and struct
    /// fields (inherited fields included). Without a coercer this is the
    /// identity.
    pub fn coerce_recursive(&self, type_name: &str, is_array: bool, value: Value) -> Value {
        match &self.coercer {
            Some(coercer) => self.coerce_with(coercer.as_ref(), type_name, is_array, value),
            None => value,
        }
    }

    fn coerce_with(
        &self,
        coercer: &dyn Coercer,
        type_name: &str,
        is_array: bool,
        value: Value,
    ) -> Value {
        if value.is_null() {
            return value;
        }

        if is_array {
            return match value {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| self.coerce_with(coercer, type_name, false, item))
                        .collect(),
                ),
                other => other,
            };
        }

        if PRIMITIVES.contains(&type_name) {
            return coercer.coerce(type_name, value);
        }

        match (self.struct_fields(type_name), value) {
            (Some(fields), Value::Object(mut obj)) => {
                for field in fields {
                    if let Some(slot) = obj.get_mut(&field.name) {
                        let current = slot.take();
                        *slot = self.coerce_with(coercer, &field.type_name, field.is_array, current);
                    }
                }
                Value::Object(obj)
            }
            (_, other) => other,
        }
    }
}
