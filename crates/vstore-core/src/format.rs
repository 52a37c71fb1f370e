//! Wire format capability

use crate::error::FormatError;
use serde_json::Value;
use std::path::Path;

/// Formatting options forwarded to [`Format::encode`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit the smallest representation the format supports
    pub compact: bool,
}

/// Converts structured values to and from bytes in one wire format
///
/// `decode` must reject malformed input with [`FormatError::Decode`] instead
/// of coercing it into a plausible-looking value.
pub trait Format: Send + Sync {
    /// Human-readable format name (e.g. `"json"`)
    fn name(&self) -> &str;

    /// File extensions handled by this format, without the dot
    fn extensions(&self) -> &[&str];

    /// Parse bytes into a structured value
    ///
    /// # Errors
    /// Returns [`FormatError::Decode`] if the bytes are not a valid document.
    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError>;

    /// Render a structured value as bytes
    ///
    /// # Errors
    /// Returns [`FormatError::Encode`] if the value cannot be represented.
    fn encode(&self, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, FormatError>;

    /// Check if this format claims the given path by extension
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }
}
