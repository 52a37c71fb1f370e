//! Versioned, schema-validated file persistence
//!
//! Values are checked against a shape before they are trusted, absent or
//! malformed files fall back to a default, and older on-disk shapes are
//! upgraded through hand-written migration steps.
//!
//! This crate gathers the engine ([`vstore_core`]), the wire formats
//! ([`vstore_formats`]) and the shape contracts ([`vstore_schema`]), and adds
//! [`open`], which picks the format from the file extension.
//!
//! ```rust,ignore
//! use vstore::prelude::*;
//!
//! let store = vstore::open(
//!     StoreConfig::new(SerdeSchema::<Settings>::new())
//!         .with_version(2)
//!         .with_migration(MigrationStep::sync(1, SerdeSchema::<SettingsV1>::new(), upgrade))
//!         .with_default_fn(Settings::default),
//!     "settings.yaml",
//! )?;
//! let settings = store.load("settings.yaml", LoadOptions::default()).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod open;

pub use open::{open, open_with, OpenError};

pub use vstore_core::{
    BoxError, ChainError, DefaultValue, EncodeOptions, ErrorKind, FileInfo, Format, FormatError,
    FsStorage, Issue, LoadOptions, MemoryStorage, MigrationChain, MigrationError, MigrationReport,
    MigrationStep, SaveOptions, Schema, SchemaError, Storage, StorageError, Store, StoreConfig,
    StoreError, StoreResult, TagFault, Value, VersionEnvelope, DEFAULT_VERSION_KEY,
};
pub use vstore_formats::{FormatRegistry, JsonFormat};
#[cfg(feature = "toml")]
pub use vstore_formats::TomlFormat;
#[cfg(feature = "yaml")]
pub use vstore_formats::YamlFormat;
pub use vstore_schema::{codec, AnyValue, ContractError, JsonSchemaContract, SerdeSchema};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and using stores
    pub use crate::open::{open, OpenError};
    pub use vstore_core::prelude::*;
    pub use vstore_formats::JsonFormat;
    pub use vstore_schema::{AnyValue, JsonSchemaContract, SerdeSchema};
}
