//! TOML wire format
//!
//! The document root must be a table. TOML has no null, so values
//! containing `null` fail to encode. Datetimes decode to their RFC 3339
//! string; non-finite floats have no structured equivalent and fail to
//! decode.

use serde_json::{Map, Number};
use vstore_core::{EncodeOptions, Format, FormatError, Value};

const NAME: &str = "toml";

/// TOML format
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl TomlFormat {
    /// Create new TOML format
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Format for TomlFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| FormatError::decode(NAME, format!("invalid UTF-8: {e}")))?;
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| FormatError::decode(NAME, format!("TOML parse error: {e}")))?;
        to_structured(toml::Value::Table(table))
    }

    fn encode(&self, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, FormatError> {
        if !value.is_object() {
            return Err(FormatError::encode(NAME, "document root must be a table"));
        }

        let text = if options.compact {
            toml::to_string(value)
        } else {
            toml::to_string_pretty(value)
        };
        text.map(String::into_bytes)
            .map_err(|e| FormatError::encode(NAME, e))
    }
}

fn to_structured(value: toml::Value) -> Result<Value, FormatError> {
    Ok(match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(int) => Value::from(int),
        toml::Value::Float(float) => Number::from_f64(float)
            .map(Value::Number)
            .ok_or_else(|| FormatError::decode(NAME, format!("unsupported float {float}")))?,
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(stamp) => Value::String(stamp.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(to_structured)
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, item)| Ok((key, to_structured(item)?)))
                .collect::<Result<Map<_, _>, FormatError>>()?,
        ),
    })
}
