//! Error types for the store engine
//!
//! Two layers:
//! - Capability errors reported by the pluggable collaborators
//!   (`SchemaError`, `FormatError`, `StorageError`)
//! - `StoreError`, the typed failure surfaced by `Store::load` / `Store::save`,
//!   one variant per failure kind, each carrying the path, the versions
//!   involved and the underlying cause.

use crate::chain::ChainError;
use crate::envelope::TagFault;
use crate::runner::MigrationError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Boxed error used for causes supplied by caller code (transforms, encoders)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of every failure the store can surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Migration chain rejected at construction
    ChainInvalid,
    /// Storage read failed
    ReadFailed,
    /// Wire format could not be decoded
    DecodeFailed,
    /// Version tag missing or malformed
    InvalidVersionTag,
    /// File is newer than the store understands
    UnsupportedVersion,
    /// A migration step was missing, rejected its input, or failed
    MigrationFailed,
    /// Final value does not satisfy the current shape
    ValidationFailed,
    /// Value could not be encoded for writing
    EncodingFailed,
    /// Storage write failed
    WriteFailed,
}

impl ErrorKind {
    /// Stable machine-readable code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ChainInvalid => "CHAIN_INVALID",
            Self::ReadFailed => "READ_FAILED",
            Self::DecodeFailed => "DECODE_FAILED",
            Self::InvalidVersionTag => "INVALID_VERSION_TAG",
            Self::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Self::MigrationFailed => "MIGRATION_FAILED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::EncodingFailed => "ENCODING_FAILED",
            Self::WriteFailed => "WRITE_FAILED",
        }
    }

    /// Whether a configured default may stand in for this failure
    ///
    /// Only load-path failures qualify. Construction and save failures are
    /// always surfaced.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(
            self,
            Self::ReadFailed
                | Self::DecodeFailed
                | Self::InvalidVersionTag
                | Self::UnsupportedVersion
                | Self::MigrationFailed
                | Self::ValidationFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Typed failure surfaced by the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Migration chain failed construction-time verification
    #[error("invalid migration chain: {0}")]
    ChainInvalid(#[from] ChainError),

    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    /// File contents are not valid in the configured format
    #[error("failed to decode {} as {format}: {source}", path.display())]
    DecodeFailed {
        path: PathBuf,
        format: String,
        #[source]
        source: FormatError,
    },

    /// Version tag missing, non-integer or not positive
    #[error("invalid version tag in {}: {fault}", path.display())]
    InvalidVersionTag {
        path: PathBuf,
        #[source]
        fault: TagFault,
    },

    /// File version is newer than the store's current version
    #[error(
        "{} is at version {found}, newer than the supported version {supported}",
        path.display()
    )]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// Migration from the file version to the current version failed
    #[error(
        "migrating {} from version {from} to {to} failed: {source}",
        path.display()
    )]
    MigrationFailed {
        path: PathBuf,
        from: u32,
        to: u32,
        #[source]
        source: MigrationError,
    },

    /// Loaded value does not satisfy the current shape
    #[error("{} does not match the current shape: {source}", path.display())]
    ValidationFailed {
        path: PathBuf,
        version: Option<u32>,
        #[source]
        source: SchemaError,
    },

    /// Value could not be encoded for writing
    #[error("failed to encode value for {}: {source}", path.display())]
    EncodingFailed {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Encoded bytes could not be written
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl StoreError {
    /// Failure classification
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChainInvalid(_) => ErrorKind::ChainInvalid,
            Self::ReadFailed { .. } => ErrorKind::ReadFailed,
            Self::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            Self::InvalidVersionTag { .. } => ErrorKind::InvalidVersionTag,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::MigrationFailed { .. } => ErrorKind::MigrationFailed,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::EncodingFailed { .. } => ErrorKind::EncodingFailed,
            Self::WriteFailed { .. } => ErrorKind::WriteFailed,
        }
    }

    /// See [`ErrorKind::is_recoverable`]
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.kind().is_recoverable()
    }

    /// File path the failure relates to (none for chain errors)
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ChainInvalid(_) => None,
            Self::ReadFailed { path, .. }
            | Self::DecodeFailed { path, .. }
            | Self::InvalidVersionTag { path, .. }
            | Self::UnsupportedVersion { path, .. }
            | Self::MigrationFailed { path, .. }
            | Self::ValidationFailed { path, .. }
            | Self::EncodingFailed { path, .. }
            | Self::WriteFailed { path, .. } => Some(path),
        }
    }

    pub(crate) fn encoding(path: &Path, source: impl Into<BoxError>) -> Self {
        Self::EncodingFailed {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Location inside the value (JSON pointer style, empty for the root)
    pub path: String,
    /// What is wrong
    pub message: String,
}

impl Issue {
    /// Create issue at location
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Shape contract rejected a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render_issues(.issues))]
pub struct SchemaError {
    issues: Vec<Issue>,
}

impl SchemaError {
    /// Create from a list of issues
    #[must_use]
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Single issue at the root
    pub fn message(message: impl Into<String>) -> Self {
        Self::at("", message)
    }

    /// Single issue at a location
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(path, message)],
        }
    }

    /// Every reported issue
    #[inline]
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

fn render_issues(issues: &[Issue]) -> String {
    match issues {
        [] => "value rejected".to_string(),
        [one] => one.to_string(),
        many => many
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Wire format failure
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Bytes are not a valid document
    #[error("{format} decode error: {message}")]
    Decode { format: String, message: String },

    /// Value cannot be represented in the format
    #[error("{format} encode error: {message}")]
    Encode { format: String, message: String },
}

impl FormatError {
    /// Create decode error
    pub fn decode(format: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// Create encode error
    pub fn encode(format: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Encode {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing stored at the path
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    /// Access denied
    #[error("permission denied for {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Classify an I/O error for path
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// Nothing stored at the path
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
