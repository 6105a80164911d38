//! Contract
//!
//! The in-memory form of an IDL document: name → definition lookup tables,
//! struct fields resolved through their `extends` chains, and the
//! validation/coercion rules applied to requests and responses.
//!
//! A `Contract` is immutable once built and is shared across concurrent
//! requests behind an `Arc`.

mod coerce;
pub mod idl;
mod validate;


pub use coerce::{Coercer, DefaultCoercer};
pub use idl::{Enum, EnumValue, Function, IdlEntry, Interface, Struct, TypeSpec};
pub use validate::ValidationError;

use crate::error::{ContractError, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct Contract {
    idl: Value,
    interfaces: HashMap<String, Interface>,
    functions: HashMap<String, Function>,
    structs: HashMap<String, Struct>,
    /// Own fields first, then each ancestor's, nearest first.
    resolved_fields: HashMap<String, Vec<TypeSpec>>,
    enums: HashMap<String, Enum>,
    meta: Map<String, Value>,
    coercer: Option<Arc<dyn Coercer>>,
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("interfaces", &self.interfaces.keys().collect::<Vec<_>>())
            .field("structs", &self.structs.keys().collect::<Vec<_>>())
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .field("coercion", &self.coercer.is_some())
            .finish()
    }
}

impl Contract {
    /// Build a contract from a parsed IDL document.
    ///
    /// # Errors
    /// - `ContractError::Parse` if the document is not a list of IDL entries
    /// - `ContractError::Duplicate` if a name is defined twice
    /// - `ContractError::UnknownParent` / `CyclicExtends` if a struct's
    ///   `extends` chain is broken
    pub fn new(idl: Value) -> Result<Self> {
        let entries: Vec<IdlEntry> = serde_json::from_value(idl.clone())?;

        let mut interfaces = HashMap::new();
        let mut functions = HashMap::new();
        let mut structs = HashMap::new();
        let mut enums = HashMap::new();
        let mut meta = Map::new();

        for entry in entries {
            match entry {
                IdlEntry::Interface(iface) => {
                    for func in &iface.functions {
                        let key = format!("{}.{}", iface.name, func.name);
                        if functions.insert(key.clone(), func.clone()).is_some() {
                            return Err(ContractError::Duplicate(key));
                        }
                    }
                    let name = iface.name.clone();
                    if interfaces.insert(name.clone(), iface).is_some() {
                        return Err(ContractError::Duplicate(name));
                    }
                }
                IdlEntry::Struct(s) => {
                    let name = s.name.clone();
                    if structs.insert(name.clone(), s).is_some() {
                        return Err(ContractError::Duplicate(name));
                    }
                }
                IdlEntry::Enum(e) => {
                    let name = e.name.clone();
                    if enums.insert(name.clone(), e).is_some() {
                        return Err(ContractError::Duplicate(name));
                    }
                }
                IdlEntry::Meta(entries) => {
                    meta.extend(entries.into_iter().filter(|(k, _)| k != "type"));
                }
            }
        }

        let resolved_fields = structs
            .keys()
            .map(|name| Ok((name.clone(), resolve_fields(&structs, name)?)))
            .collect::<Result<HashMap<_, _>>>()?;

        tracing::debug!(
            interfaces = interfaces.len(),
            functions = functions.len(),
            structs = structs.len(),
            enums = enums.len(),
            "Contract loaded"
        );

        Ok(Self {
            idl,
            interfaces,
            functions,
            structs,
            resolved_fields,
            enums,
            meta,
            coercer: None,
        })
    }

    /// Install a coercer used by `validate_request` and `coerce_recursive`.
    pub fn with_coercer(mut self, coercer: Arc<dyn Coercer>) -> Self {
        self.coercer = Some(coercer);
        self
    }

    /// The raw document this contract was built from.
    pub fn idl(&self) -> &Value {
        &self.idl
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    /// Look up a function by its `"Interface.function"` method name.
    pub fn function(&self, method: &str) -> Option<&Function> {
        self.functions.get(method)
    }

    pub fn struct_def(&self, name: &str) -> Option<&Struct> {
        self.structs.get(name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&Enum> {
        self.enums.get(name)
    }

    /// All fields of `name`, including inherited ones.
    pub fn struct_fields(&self, name: &str) -> Option<&[TypeSpec]> {
        self.resolved_fields.get(name).map(Vec::as_slice)
    }

    pub fn coercion_enabled(&self) -> bool {
        self.coercer.is_some()
    }
}

/// Walk the `extends` chain of `name`, collecting fields child-first.
fn resolve_fields(structs: &HashMap<String, Struct>, name: &str) -> Result<Vec<TypeSpec>> {
    let mut fields = Vec::new();
    let mut chain: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let mut current = structs.get(name);

    while let Some(s) = current {
        if !seen.insert(s.name.as_str()) {
            chain.push(s.name.clone());
            return Err(ContractError::CyclicExtends { chain });
        }
        chain.push(s.name.clone());
        fields.extend(s.fields.iter().cloned());

        current = match s.parent() {
            None => None,
            Some(parent) => Some(structs.get(parent).ok_or_else(|| {
                ContractError::UnknownParent {
                    child: s.name.clone(),
                    parent: parent.to_string(),
                }
            })?),
        };
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn struct_entry(name: &str, extends: &str, field: &str) -> Value {
        json!({
            "type": "struct", "name": name, "extends": extends,
            "fields": [{"name": field, "type": "string", "is_array": false, "optional": false}]
        })
    }

    #[test]
    fn test_builds_lookup_tables() {
        let contract = Contract::new(json!([
            {
                "type": "interface", "name": "Calc",
                "functions": [{
                    "name": "add",
                    "params": [
                        {"name": "a", "type": "int", "is_array": false},
                        {"name": "b", "type": "int", "is_array": false}
                    ],
                    "returns": {"type": "int", "is_array": false}
                }]
            },
            {"type": "enum", "name": "Op", "values": [{"value": "add"}, {"value": "mul"}]},
            {"type": "meta", "barrister_version": "0.1.6", "checksum": "abc"}
        ]))
        .unwrap();

        assert!(contract.interface("Calc").is_some());
        assert_eq!(contract.function("Calc.add").unwrap().params.len(), 2);
        assert!(contract.function("Calc.sub").is_none());
        assert!(contract.enum_def("Op").unwrap().contains("mul"));
        assert_eq!(contract.meta().get("checksum"), Some(&json!("abc")));
        assert!(!contract.meta().contains_key("type"));
    }

    #[test]
    fn test_resolves_fields_child_first() {
        let contract = Contract::new(json!([
            struct_entry("Base", "", "id"),
            struct_entry("Mid", "Base", "created"),
            struct_entry("Leaf", "Mid", "label"),
        ]))
        .unwrap();

        let names: Vec<_> = contract
            .struct_fields("Leaf")
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["label", "created", "id"]);
    }

    #[test]
    fn test_rejects_cyclic_extends() {
        let err = Contract::new(json!([
            struct_entry("A", "B", "a"),
            struct_entry("B", "C", "b"),
            struct_entry("C", "A", "c"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ContractError::CyclicExtends { .. }));
    }

    #[test]
    fn test_rejects_self_extends() {
        let err = Contract::new(json!([struct_entry("A", "A", "a")])).unwrap_err();
        match err {
            ContractError::CyclicExtends { chain } => assert_eq!(chain, vec!["A", "A"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_unknown_parent() {
        let err = Contract::new(json!([struct_entry("A", "Ghost", "a")])).unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = Contract::new(json!([
            struct_entry("User", "", "id"),
            struct_entry("User", "", "email"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ContractError::Duplicate(ref name) if name == "User"));

        let iface = json!({"type": "interface", "name": "Calc", "functions": []});
        let err = Contract::new(json!([iface.clone(), iface])).unwrap_err();
        assert!(matches!(err, ContractError::Duplicate(ref name) if name == "Calc"));
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(matches!(
            Contract::new(json!({"type": "interface"})),
            Err(ContractError::Parse(_))
        ));
    }
}
