// IDL Document Model
//
// Mirrors the JSON document produced by the IDL compiler: an ordered list of
// entries tagged by "type". Unknown keys (comments, checksums) are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Primitive type names understood by the validator.
pub const PRIMITIVES: [&str; 4] = ["string", "bool", "int", "float"];

/// One top-level entry of an IDL document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IdlEntry {
    Interface(Interface),
    Struct(Struct),
    Enum(Enum),
    Meta(Map<String, Value>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeSpec>,
    pub returns: TypeSpec,
}

/// A parameter, field or return type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Empty for return specs.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub optional: bool,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_array: false,
            optional: false,
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    /// The IDL compiler emits `""` when there is no parent.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<TypeSpec>,
}

impl Struct {
    pub fn parent(&self) -> Option<&str> {
        self.extends.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub value: String,
}

impl Enum {
    pub fn contains(&self, candidate: &str) -> bool {
        self.values.iter().any(|v| v.value == candidate)
    }
}
