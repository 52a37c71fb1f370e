//! Shape contracts for vstore
//!
//! Implementations of [`vstore_core::Schema`]:
//! - [`SerdeSchema`]: a Rust type is its own shape (serde `Deserialize`/`Serialize`)
//! - [`JsonSchemaContract`]: a JSON Schema document checks an untyped value
//! - [`AnyValue`]: accepts every value unchanged
//!
//! [`codec`] holds serde field adapters for values whose wire representation
//! differs from their in-memory type.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod any;
pub mod codec;
mod json_schema;
mod serde_schema;

pub use any::AnyValue;
pub use json_schema::{ContractError, JsonSchemaContract};
pub use serde_schema::SerdeSchema;
