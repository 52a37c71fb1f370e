//! Serde-typed shapes
//!
//! The Rust type is the contract. Deserialization enforces field presence
//! and types; refinements add checks serde cannot express. Unknown fields
//! are ignored unless the type opts into `#[serde(deny_unknown_fields)]`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use vstore_core::{Issue, Schema, SchemaError, Value};

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Refinement<T> {
    path: String,
    message: String,
    holds: Predicate<T>,
}

/// Shape backed by a serde type
pub struct SerdeSchema<T> {
    refinements: Vec<Refinement<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    /// Shape with no refinements
    #[must_use]
    pub fn new() -> Self {
        Self {
            refinements: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a check on the decoded value, reported at the root
    #[must_use]
    pub fn refine<P>(self, message: impl Into<String>, holds: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.refine_at("", message, holds)
    }

    /// Add a check on the decoded value, reported at `path`
    #[must_use]
    pub fn refine_at<P>(
        mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        holds: P,
    ) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.refinements.push(Refinement {
            path: path.into(),
            message: message.into(),
            holds: Box::new(holds),
        });
        self
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeSchema")
            .field("type", &std::any::type_name::<T>())
            .field("refinements", &self.refinements.len())
            .finish()
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn validate(&self, raw: &Value) -> Result<T, SchemaError> {
        let value = <T as Deserialize>::deserialize(raw)
            .map_err(|e| SchemaError::message(e.to_string()))?;

        let failed: Vec<Issue> = self
            .refinements
            .iter()
            .filter(|r| !(r.holds)(&value))
            .map(|r| Issue::new(r.path.clone(), r.message.clone()))
            .collect();

        if failed.is_empty() {
            Ok(value)
        } else {
            Err(SchemaError::new(failed))
        }
    }

    fn encode(&self, value: &T) -> Result<Value, SchemaError> {
        serde_json::to_value(value).map_err(|e| SchemaError::message(e.to_string()))
    }
}
