//! JSON Schema backed shapes
//!
//! For stores that keep an untyped [`Value`] but still want the file
//! contents checked. Every violation is reported, each at its JSON pointer.

use jsonschema::JSONSchema;
use std::fmt;
use vstore_core::{Issue, Schema, SchemaError, Value};

/// The schema document itself is invalid
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid JSON Schema document: {message}")]
pub struct ContractError {
    message: String,
}

/// Shape checked against a compiled JSON Schema document
pub struct JsonSchemaContract {
    document: Value,
    compiled: JSONSchema,
}

impl JsonSchemaContract {
    /// Compile a schema document
    ///
    /// # Errors
    /// [`ContractError`] if `document` is not a usable JSON Schema.
    pub fn compile(document: Value) -> Result<Self, ContractError> {
        let compiled = JSONSchema::compile(&document).map_err(|e| ContractError {
            message: e.to_string(),
        })?;
        Ok(Self { document, compiled })
    }

    /// The source document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl fmt::Debug for JsonSchemaContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaContract")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl Schema for JsonSchemaContract {
    type Value = Value;

    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        if let Err(errors) = self.compiled.validate(raw) {
            let issues = errors
                .map(|e| Issue::new(e.instance_path.to_string(), e.to_string()))
                .collect();
            return Err(SchemaError::new(issues));
        }
        Ok(raw.clone())
    }

    fn encode(&self, value: &Value) -> Result<Value, SchemaError> {
        self.validate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings_contract() -> JsonSchemaContract {
        JsonSchemaContract::compile(json!({
            "type": "object",
            "required": ["theme"],
            "properties": {
                "theme": {"enum": ["light", "dark"]},
                "font_size": {"type": "integer", "minimum": 6}
            }
        }))
        .unwrap()
    }

    #[test]
    fn accepts_conforming_value() {
        let contract = settings_contract();
        let value = json!({"theme": "dark", "font_size": 12});
        assert_eq!(contract.validate(&value).unwrap(), value);
    }

    #[test]
    fn reports_each_violation_at_its_pointer() {
        let err = settings_contract()
            .validate(&json!({"theme": "blue", "font_size": 2}))
            .unwrap_err();

        let mut paths: Vec<&str> = err.issues().iter().map(|i| i.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["/font_size", "/theme"]);
    }

    #[test]
    fn missing_required_field_reported_at_root() {
        let err = settings_contract().validate(&json!({})).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].path, "");
        assert!(err.to_string().contains("theme"));
    }

    #[test]
    fn encode_refuses_nonconforming_value() {
        assert!(settings_contract().encode(&json!({"theme": 3})).is_err());
    }

    #[test]
    fn invalid_document_rejected() {
        let err = JsonSchemaContract::compile(json!({"type": "no-such-type"})).unwrap_err();
        assert!(err.to_string().contains("invalid JSON Schema document"));
    }
}
