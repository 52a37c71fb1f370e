//! Shape contract capability
//!
//! The engine never inspects values itself. A [`Schema`] decides whether a
//! structured value is acceptable and how a typed value is written back out.

use crate::error::SchemaError;
use serde_json::Value;
use std::sync::Arc;

/// Validation and encoding rule for one version of the stored data
///
/// `validate` turns an untrusted structured value into the typed value,
/// applying any value-level codecs (for example a boolean stored as
/// `"true"`). `encode` is the inverse and may be the identity.
///
/// Implementations are never handed the version tag field.
pub trait Schema: Send + Sync + 'static {
    /// Typed value produced by validation
    type Value: Send + 'static;

    /// Validate and decode a structured value
    ///
    /// # Errors
    /// Returns every problem found when the value does not match.
    fn validate(&self, raw: &Value) -> Result<Self::Value, SchemaError>;

    /// Encode a typed value into its structured form
    ///
    /// # Errors
    /// Returns an error if the value cannot be represented.
    fn encode(&self, value: &Self::Value) -> Result<Value, SchemaError>;
}

impl<S: Schema> Schema for Arc<S> {
    type Value = S::Value;

    #[inline]
    fn validate(&self, raw: &Value) -> Result<Self::Value, SchemaError> {
        (**self).validate(raw)
    }

    #[inline]
    fn encode(&self, value: &Self::Value) -> Result<Value, SchemaError> {
        (**self).encode(value)
    }
}
