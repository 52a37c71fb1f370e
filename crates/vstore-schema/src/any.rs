//! Identity shape

use vstore_core::{Schema, SchemaError, Value};

/// Shape accepting any structured value as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyValue;

impl Schema for AnyValue {
    type Value = Value;

    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        Ok(raw.clone())
    }

    fn encode(&self, value: &Value) -> Result<Value, SchemaError> {
        Ok(value.clone())
    }
}
