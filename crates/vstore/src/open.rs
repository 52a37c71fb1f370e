//! Format selection by file extension

use std::path::{Path, PathBuf};
use vstore_core::{Schema, Store, StoreConfig, StoreError};
use vstore_formats::FormatRegistry;

/// Failure to open a store for a path
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// No registered format claims the path's extension
    #[error("no format registered for {} (known extensions: {})", path.display(), known.join(", "))]
    UnknownFormat {
        path: PathBuf,
        known: Vec<String>,
    },

    /// Store construction failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build a store whose format is chosen from `path`'s extension
///
/// Uses the built-in registry. The store is not tied to `path`; it is only
/// consulted for the extension.
///
/// # Errors
/// [`OpenError::UnknownFormat`] for unrecognized extensions,
/// [`OpenError::Store`] if the migration chain is invalid.
pub fn open<S: Schema>(
    config: StoreConfig<S>,
    path: impl AsRef<Path>,
) -> Result<Store<S>, OpenError> {
    open_with(vstore_formats::builtin(), config, path)
}

/// [`open`] against a caller-supplied registry
///
/// # Errors
/// Same as [`open`].
pub fn open_with<S: Schema>(
    registry: &FormatRegistry,
    config: StoreConfig<S>,
    path: impl AsRef<Path>,
) -> Result<Store<S>, OpenError> {
    let path = path.as_ref();
    let Some(format) = registry.for_path(path) else {
        return Err(OpenError::UnknownFormat {
            path: path.to_path_buf(),
            known: registry
                .all_extensions()
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
    };

    tracing::debug!("opening {} as {}", path.display(), format.name());
    Ok(Store::with_format(config, format)?)
}
