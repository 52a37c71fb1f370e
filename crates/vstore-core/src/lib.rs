//! vstore core engine
//!
//! Persists schema-validated values to files and upgrades older on-disk
//! shapes through a chain of hand-written migration steps.
//!
//! # Pipeline
//!
//! ```text
//!             ┌──────────── construction ────────────┐
//! StoreConfig → MigrationChain::validate → Store
//!
//! save: value → Schema::encode → VersionEnvelope::wrap → Format::encode → Storage::write
//! load: Storage::read → Format::decode → VersionEnvelope::unwrap
//!         → runner::run (file version < current) → Schema::validate → value
//!                 └─ any failure → default value | StoreError
//! ```
//!
//! The three capabilities ([`Schema`], [`Format`], [`Storage`]) are traits;
//! concrete formats and shapes live in `vstore-formats` and `vstore-schema`.
//!
//! # Example
//!
//! ```rust,ignore
//! use vstore::prelude::*;
//!
//! # async fn example() -> Result<(), StoreError> {
//! let store = Store::new(
//!     StoreConfig::new(SerdeSchema::<Settings>::new())
//!         .with_version(2)
//!         .with_migration(MigrationStep::sync(1, SerdeSchema::<SettingsV1>::new(), upgrade))
//!         .with_default(Settings::default()),
//!     JsonFormat::new(),
//! )?;
//!
//! let settings = store.load("settings.json", LoadOptions::default()).await?;
//! store.save(&settings, "settings.json", SaveOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod chain;
pub mod envelope;
pub mod error;
pub mod format;
pub mod runner;
pub mod schema;
pub mod storage;
pub mod store;

pub use chain::{ChainError, MigrationChain, MigrationStep};
pub use envelope::{TagFault, VersionEnvelope, DEFAULT_VERSION_KEY};
pub use error::{
    BoxError, ErrorKind, FormatError, Issue, SchemaError, StorageError, StoreError, StoreResult,
};
pub use format::{EncodeOptions, Format};
pub use runner::MigrationError;
pub use schema::Schema;
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use store::{
    DefaultValue, FileInfo, LoadOptions, MigrationReport, SaveOptions, Store, StoreConfig,
};

/// Structured value exchanged between formats, shapes and migrations
pub use serde_json::Value;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and using stores
    pub use crate::chain::MigrationStep;
    pub use crate::error::{ErrorKind, SchemaError, StoreError};
    pub use crate::format::Format;
    pub use crate::schema::Schema;
    pub use crate::storage::{FsStorage, MemoryStorage, Storage};
    pub use crate::store::{LoadOptions, SaveOptions, Store, StoreConfig};
}
