//! Wire formats for vstore
//!
//! Implementations of [`vstore_core::Format`]:
//! - JSON via `serde_json` (always available)
//! - YAML via `serde_yaml` (`yaml` feature)
//! - TOML via `toml` (`toml` feature)
//!
//! [`FormatRegistry`] maps file extensions to formats. The built-in registry
//! is constructed once, on first use, and shared afterwards.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use once_cell::sync::Lazy;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use vstore_core::Format;

mod json;
#[cfg(feature = "toml")]
mod toml_format;
#[cfg(feature = "yaml")]
mod yaml;

pub use json::JsonFormat;
#[cfg(feature = "toml")]
pub use toml_format::TomlFormat;
#[cfg(feature = "yaml")]
pub use yaml::YamlFormat;

/// Formats looked up by file extension or name
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<Arc<dyn Format>>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .field("extensions", &self.all_extensions())
            .finish()
    }
}

impl FormatRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Registry holding every format compiled into this crate
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(JsonFormat::new());
        #[cfg(feature = "yaml")]
        registry.register(YamlFormat::new());
        #[cfg(feature = "toml")]
        registry.register(TomlFormat::new());
        registry
    }

    /// Register a format
    ///
    /// Later registrations win when extensions overlap.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.register_shared(Arc::new(format));
    }

    /// Register an already shared format handle
    pub fn register_shared(&mut self, format: Arc<dyn Format>) {
        self.formats.insert(0, format);
    }

    /// Find the format claiming `path` by extension
    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn Format>> {
        self.formats.iter().find(|f| f.handles(path)).cloned()
    }

    /// Find a format by name (case-insensitive)
    #[must_use]
    pub fn for_name(&self, name: &str) -> Option<Arc<dyn Format>> {
        self.formats
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Names of registered formats
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    /// Every registered extension
    #[must_use]
    pub fn all_extensions(&self) -> Vec<&str> {
        self.formats
            .iter()
            .flat_map(|f| f.extensions())
            .copied()
            .collect()
    }
}

static BUILTIN: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::with_builtin);

/// Shared registry of built-in formats, created on first call
#[inline]
#[must_use]
pub fn builtin() -> &'static FormatRegistry {
    &BUILTIN
}

/// Built-in format for `path`, by extension
#[must_use]
pub fn for_path(path: impl AsRef<Path>) -> Option<Arc<dyn Format>> {
    builtin().for_path(path.as_ref())
}
