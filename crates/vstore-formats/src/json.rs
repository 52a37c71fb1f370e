//! JSON wire format
//!
//! Uses serde_json. Pretty output is two-space indented with a trailing
//! newline; compact output is a single line.

use vstore_core::{EncodeOptions, Format, FormatError, Value};

const NAME: &str = "json";

/// JSON format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl JsonFormat {
    /// Create new JSON format
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Format for JsonFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        serde_json::from_slice(bytes)
            .map_err(|e| FormatError::decode(NAME, format!("JSON parse error: {e}")))
    }

    fn encode(&self, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, FormatError> {
        if options.compact {
            return serde_json::to_vec(value).map_err(|e| FormatError::encode(NAME, e));
        }

        let mut out = serde_json::to_vec_pretty(value).map_err(|e| FormatError::encode(NAME, e))?;
        out.push(b'\n');
        Ok(out)
    }
}
