//! YAML wire format
//!
//! Uses serde_yaml. A file must hold exactly one document; empty input is a
//! decode error rather than a null value. YAML has no compact block style, so
//! `compact` is ignored.

use vstore_core::{EncodeOptions, Format, FormatError, Value};

const NAME: &str = "yaml";

/// YAML format
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl YamlFormat {
    /// Create new YAML format
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Format for YamlFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| FormatError::decode(NAME, format!("invalid UTF-8: {e}")))?;

        if text.trim().is_empty() {
            return Err(FormatError::decode(NAME, "empty YAML document"));
        }

        serde_yaml::from_str(text)
            .map_err(|e| FormatError::decode(NAME, format!("YAML parse error: {e}")))
    }

    fn encode(&self, value: &Value, _options: &EncodeOptions) -> Result<Vec<u8>, FormatError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| FormatError::encode(NAME, e))
    }
}
