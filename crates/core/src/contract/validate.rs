// Structural validation of values, requests and responses against a Contract

use super::idl::TypeSpec;
use super::Contract;
use crate::protocol::{error_code, ErrorObject, Request, Response, IDL_METHOD};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::warn;

/// Why a value failed validation; the message starts with the value's path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn mismatch(prefix: &str, expected: &str, actual: &str, value: &Value) -> Self {
        Self(format!(
            "{} expects type '{}' but got type '{}' for value: {}",
            prefix,
            expected,
            actual,
            render(value)
        ))
    }
}

type Validation = std::result::Result<(), ValidationError>;

impl Contract {
    /// Validate `value` against `spec`.
    ///
    /// `value` is `None` when the key is absent altogether; absent and `null`
    /// values only pass when `spec.optional` is set. `is_array` is passed
    /// separately so array elements can be checked against the same spec.
    pub fn validate(
        &self,
        prefix: &str,
        spec: &TypeSpec,
        is_array: bool,
        value: Option<&Value>,
    ) -> Validation {
        let value = match value {
            None | Some(Value::Null) => {
                return if spec.optional {
                    Ok(())
                } else {
                    Err(ValidationError(format!("{} cannot be null", prefix)))
                };
            }
            Some(v) => v,
        };

        if is_array {
            let items = value.as_array().ok_or_else(|| {
                ValidationError::mismatch(
                    prefix,
                    &format!("[]{}", spec.type_name),
                    type_of(value),
                    value,
                )
            })?;
            for (i, item) in items.iter().enumerate() {
                self.validate(&format!("{}[{}]", prefix, i), spec, false, Some(item))?;
            }
            return Ok(());
        }

        let expected = spec.type_name.as_str();
        match expected {
            "string" if value.is_string() => Ok(()),
            "bool" if value.is_boolean() => Ok(()),
            "float" if value.is_number() => Ok(()),
            "int" => match value {
                Value::Number(n) if is_integral(n) => Ok(()),
                _ => Err(ValidationError::mismatch(prefix, expected, type_of(value), value)),
            },
            "string" | "bool" | "float" => Err(ValidationError::mismatch(
                prefix,
                expected,
                type_of(value),
                value,
            )),
            _ => self.validate_user_type(prefix, expected, value),
        }
    }

    fn validate_user_type(&self, prefix: &str, type_name: &str, value: &Value) -> Validation {
        if let Some(fields) = self.struct_fields(type_name) {
            let obj = value.as_object().ok_or_else(|| {
                ValidationError::mismatch(prefix, type_name, type_of(value), value)
            })?;

            for field in fields {
                self.validate(
                    &format!("{}.{}", prefix, field.name),
                    field,
                    field.is_array,
                    obj.get(&field.name),
                )?;
            }

            if let Some(unknown) = obj.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
                return Err(ValidationError(format!(
                    "{}.{} does not exist in type '{}'",
                    prefix, unknown, type_name
                )));
            }
            return Ok(());
        }

        if let Some(def) = self.enum_def(type_name) {
            let s = value.as_str().ok_or_else(|| {
                ValidationError::mismatch(prefix, type_name, type_of(value), value)
            })?;
            if def.contains(s) {
                return Ok(());
            }
            let allowed: Vec<&str> = def.values.iter().map(|v| v.value.as_str()).collect();
            return Err(ValidationError(format!(
                "{} value '{}' is not in the enum '{}': {:?}",
                prefix, s, def.name, allowed
            )));
        }

        // Only reachable with a malformed contract
        Err(ValidationError(format!("{} unknown type: {}", prefix, type_name)))
    }

    /// Check a request's params against the IDL function it names.
    ///
    /// When a coercer is installed, each param that fails gets one coercion
    /// pass (rewriting `req.params[i]` in place) and is validated again.
    pub fn validate_request(&self, req: &mut Request) -> Result<(), ErrorObject> {
        if req.method == IDL_METHOD {
            return Ok(());
        }

        let func = self.function(&req.method).ok_or_else(|| {
            ErrorObject::new(
                error_code::METHOD_NOT_FOUND,
                format!("Method not found: {}", req.method),
            )
        })?;

        if req.params.len() != func.params.len() {
            return Err(ErrorObject::new(
                error_code::INVALID_PARAMS,
                format!(
                    "Param length: {} != expected length: {}",
                    req.params.len(),
                    func.params.len()
                ),
            ));
        }

        for (i, spec) in func.params.iter().enumerate() {
            let mut outcome = self.validate(&spec.name, spec, spec.is_array, Some(&req.params[i]));

            if outcome.is_err() && self.coercion_enabled() {
                let original = std::mem::take(&mut req.params[i]);
                req.params[i] = self.coerce_recursive(&spec.type_name, spec.is_array, original);
                outcome = self.validate(&spec.name, spec, spec.is_array, Some(&req.params[i]));
            }

            if let Err(err) = outcome {
                return Err(ErrorObject::new(
                    error_code::INVALID_PARAMS,
                    format!("Invalid request param[{}]: {}", i, err),
                ));
            }
        }

        Ok(())
    }

    /// Check an outgoing result against the function's return type.
    ///
    /// Error responses and the IDL method pass through untouched; a result
    /// that breaks the contract is replaced by an `INVALID_RESPONSE` error.
    pub fn validate_response(&self, req: &Request, resp: Response) -> Response {
        if resp.is_error() || req.method == IDL_METHOD {
            return resp;
        }

        let Some(func) = self.function(&req.method) else {
            return Response::error(
                req.id.clone(),
                ErrorObject::new(
                    error_code::METHOD_NOT_FOUND,
                    format!("Method not found: {}", req.method),
                ),
            );
        };

        let returns = &func.returns;
        match self.validate("", returns, returns.is_array, resp.result.as_ref()) {
            Ok(()) => resp,
            Err(err) => {
                let msg = format!("Invalid response for {}: {}", req.method, err);
                warn!(method = %req.method, error = %err, "Handler result failed contract");
                Response::error(
                    req.id.clone(),
                    ErrorObject::new(error_code::INVALID_RESPONSE, msg),
                )
            }
        }
    }
}

pub(crate) fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if is_integral(n) => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
