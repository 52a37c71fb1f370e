//! Load/save orchestration
//!
//! ```text
//! save: Schema::encode → envelope wrap → Format::encode → Storage::write
//! load: Storage::read → Format::decode → envelope unwrap → migrations
//!       → Schema::validate
//! ```
//!
//! Every load-path failure goes through one recovery decision: return the
//! configured default, or surface the typed error. `throw_on_error` always
//! surfaces; a store without a default always surfaces.

use crate::chain::{MigrationChain, MigrationStep};
use crate::envelope::{VersionEnvelope, DEFAULT_VERSION_KEY};
use crate::error::{StoreError, StoreResult};
use crate::format::{EncodeOptions, Format};
use crate::runner;
use crate::schema::Schema;
use crate::storage::{FsStorage, Storage};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Value returned when a load fails softly
///
/// Either a literal (cloned on every use) or a producer invoked once per
/// fallback. Results are never cached between loads.
pub struct DefaultValue<T> {
    produce: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> DefaultValue<T> {
    /// Literal default
    pub fn value(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(move || value.clone()),
        }
    }

    /// Default computed fresh on every fallback
    pub fn from_fn<F>(produce: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(produce),
        }
    }

    /// Produce a default instance
    #[inline]
    pub fn produce(&self) -> T {
        (self.produce)()
    }
}

impl<T> Clone for DefaultValue<T> {
    fn clone(&self) -> Self {
        Self {
            produce: Arc::clone(&self.produce),
        }
    }
}

impl<T> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultValue").finish_non_exhaustive()
    }
}

/// Store configuration
///
/// # Example
///
/// ```rust,ignore
/// let config = StoreConfig::new(SerdeSchema::<Settings>::new())
///     .with_version(3)
///     .with_migration(MigrationStep::sync(1, SerdeSchema::<V1>::new(), v1_to_v2))
///     .with_migration(MigrationStep::sync(2, SerdeSchema::<V2>::new(), v2_to_v3))
///     .with_default(Settings::default());
/// let store = Store::new(config, JsonFormat::new())?;
/// ```
pub struct StoreConfig<S: Schema> {
    shape: S,
    current_version: Option<u32>,
    migrations: Vec<MigrationStep>,
    default: Option<DefaultValue<S::Value>>,
    version_key: String,
}

impl<S: Schema> StoreConfig<S> {
    /// Unversioned configuration for a shape
    pub fn new(shape: S) -> Self {
        Self {
            shape,
            current_version: None,
            migrations: Vec::new(),
            default: None,
            version_key: DEFAULT_VERSION_KEY.to_string(),
        }
    }

    /// Enable versioning at `version`
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.current_version = Some(version);
        self
    }

    /// Add one migration step
    #[must_use]
    pub fn with_migration(mut self, step: MigrationStep) -> Self {
        self.migrations.push(step);
        self
    }

    /// Add several migration steps
    #[must_use]
    pub fn with_migrations(mut self, steps: impl IntoIterator<Item = MigrationStep>) -> Self {
        self.migrations.extend(steps);
        self
    }

    /// Literal default for soft failures
    #[must_use]
    pub fn with_default(mut self, value: S::Value) -> Self
    where
        S::Value: Clone + Sync,
    {
        self.default = Some(DefaultValue::value(value));
        self
    }

    /// Producer default, invoked on every soft failure
    #[must_use]
    pub fn with_default_fn<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> S::Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::from_fn(produce));
        self
    }

    /// Rename the reserved version field (default `_version`)
    #[must_use]
    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_key = key.into();
        self
    }
}

impl<S: Schema> fmt::Debug for StoreConfig<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("current_version", &self.current_version)
            .field("migrations", &self.migrations.len())
            .field("has_default", &self.default.is_some())
            .field("version_key", &self.version_key)
            .finish_non_exhaustive()
    }
}

/// Options for [`Store::load`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Surface every failure even when a default is configured
    pub throw_on_error: bool,
}

impl LoadOptions {
    /// Strict loading: never fall back to the default
    #[inline]
    #[must_use]
    pub fn strict() -> Self {
        Self {
            throw_on_error: true,
        }
    }
}

/// Options for [`Store::save`], forwarded to the format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Smallest representation the format supports
    pub compact: bool,
}

impl SaveOptions {
    /// Compact output
    #[inline]
    #[must_use]
    pub fn compact() -> Self {
        Self { compact: true }
    }
}

impl From<SaveOptions> for EncodeOptions {
    fn from(options: SaveOptions) -> Self {
        Self {
            compact: options.compact,
        }
    }
}

/// What a file holds, without validating it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Format used to decode the file
    pub format: String,
    /// Stored version tag (none for unversioned stores)
    pub version: Option<u32>,
    /// Store's current version
    pub current_version: Option<u32>,
}

impl FileInfo {
    /// File is older than the store and would be migrated on load
    #[must_use]
    pub fn needs_migration(&self) -> bool {
        matches!((self.version, self.current_version), (Some(v), Some(c)) if v < c)
    }

    /// File is newer than the store understands
    #[must_use]
    pub fn is_newer_than_supported(&self) -> bool {
        matches!((self.version, self.current_version), (Some(v), Some(c)) if v > c)
    }
}

/// Outcome of [`Store::migrate_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found on disk
    pub from: u32,
    /// Version written back
    pub to: u32,
}

/// Versioned, schema-validated file store
///
/// Holds only immutable configuration; `load` and `save` take `&self` and
/// may be called concurrently. Writers to the same path are not
/// coordinated.
pub struct Store<S: Schema> {
    shape: S,
    format: Arc<dyn Format>,
    storage: Arc<dyn Storage>,
    current_version: Option<u32>,
    chain: MigrationChain,
    default: Option<DefaultValue<S::Value>>,
    envelope: VersionEnvelope,
}

impl<S: Schema> Store<S> {
    /// Build a store, verifying the migration chain
    ///
    /// # Errors
    /// [`StoreError::ChainInvalid`] if the migrations do not cover exactly
    /// `1..current_version`.
    pub fn new<F: Format + 'static>(config: StoreConfig<S>, format: F) -> StoreResult<Self> {
        Self::with_format(config, Arc::new(format))
    }

    /// Build a store around a shared format handle
    ///
    /// # Errors
    /// Same as [`Store::new`].
    pub fn with_format(config: StoreConfig<S>, format: Arc<dyn Format>) -> StoreResult<Self> {
        let StoreConfig {
            shape,
            current_version,
            migrations,
            default,
            version_key,
        } = config;

        let chain = MigrationChain::validate(current_version, migrations)?;

        Ok(Self {
            shape,
            format,
            storage: Arc::new(FsStorage::new()),
            current_version,
            chain,
            default,
            envelope: VersionEnvelope::new(version_key),
        })
    }

    /// Replace the storage backend (filesystem by default)
    #[must_use]
    pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    /// Current version, if versioning is enabled
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> Option<u32> {
        self.current_version
    }

    /// Format name
    #[inline]
    #[must_use]
    pub fn format_name(&self) -> &str {
        self.format.name()
    }

    /// Verified migration chain
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    /// Load and validate the value stored at `path`
    ///
    /// # Errors
    /// Any load-path [`StoreError`] when `options.throw_on_error` is set or
    /// no default is configured.
    pub async fn load(&self, path: impl AsRef<Path>, options: LoadOptions) -> StoreResult<S::Value> {
        let path = path.as_ref();
        match self.read_current(path).await {
            Ok((value, _)) => Ok(value),
            Err(err) => self.recover(err, options),
        }
    }

    /// Encode and write `value` to `path`
    ///
    /// Save failures are never replaced by defaults.
    ///
    /// # Errors
    /// [`StoreError::EncodingFailed`] or [`StoreError::WriteFailed`].
    pub async fn save(
        &self,
        value: &S::Value,
        path: impl AsRef<Path>,
        options: SaveOptions,
    ) -> StoreResult<()> {
        let path = path.as_ref();

        let encoded = self
            .shape
            .encode(value)
            .map_err(|e| StoreError::encoding(path, e))?;
        let wrapped = self
            .envelope
            .wrap(encoded, self.current_version)
            .map_err(|e| StoreError::encoding(path, e))?;
        let bytes = self
            .format
            .encode(&wrapped, &options.into())
            .map_err(|e| StoreError::encoding(path, e))?;

        self.storage
            .write(path, &bytes)
            .await
            .map_err(|source| StoreError::WriteFailed {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            "saved {} ({} bytes, version {:?})",
            path.display(),
            bytes.len(),
            self.current_version
        );
        Ok(())
    }

    /// Report the file's format and version without validating its contents
    ///
    /// # Errors
    /// Read, decode or version tag failures. Defaults never apply.
    pub async fn inspect(&self, path: impl AsRef<Path>) -> StoreResult<FileInfo> {
        let path = path.as_ref();
        let (_, version) = self.read_envelope(path).await?;
        Ok(FileInfo {
            format: self.format.name().to_string(),
            version,
            current_version: self.current_version,
        })
    }

    /// Upgrade an older file in place
    ///
    /// Loads strictly and, when the file was older than the current version,
    /// saves the migrated value back. Returns `None` if nothing was written.
    ///
    /// # Errors
    /// Any load or save failure. Defaults never apply.
    pub async fn migrate_file(
        &self,
        path: impl AsRef<Path>,
        options: SaveOptions,
    ) -> StoreResult<Option<MigrationReport>> {
        let path = path.as_ref();
        let (value, found) = self.read_current(path).await?;

        let (Some(from), Some(to)) = (found, self.current_version) else {
            return Ok(None);
        };
        if from >= to {
            return Ok(None);
        }

        self.save(&value, path, options).await?;
        tracing::info!("upgraded {} from version {} to {}", path.display(), from, to);
        Ok(Some(MigrationReport { from, to }))
    }

    /// Read, decode and split off the version tag
    async fn read_envelope(&self, path: &Path) -> StoreResult<(Value, Option<u32>)> {
        let bytes = self
            .storage
            .read(path)
            .await
            .map_err(|source| StoreError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let parsed = self
            .format
            .decode(&bytes)
            .map_err(|source| StoreError::DecodeFailed {
                path: path.to_path_buf(),
                format: self.format.name().to_string(),
                source,
            })?;

        self.envelope
            .unwrap(parsed, self.current_version.is_some())
            .map_err(|fault| StoreError::InvalidVersionTag {
                path: path.to_path_buf(),
                fault,
            })
    }

    /// Full strict load: the validated value plus the version found on disk
    async fn read_current(&self, path: &Path) -> StoreResult<(S::Value, Option<u32>)> {
        let (raw, found) = self.read_envelope(path).await?;

        let raw = match (found, self.current_version) {
            (Some(found), Some(current)) if found > current => {
                return Err(StoreError::UnsupportedVersion {
                    path: path.to_path_buf(),
                    found,
                    supported: current,
                });
            }
            (Some(found), Some(current)) if found < current => {
                let migrated = runner::run(raw, found, current, &self.chain)
                    .await
                    .map_err(|source| StoreError::MigrationFailed {
                        path: path.to_path_buf(),
                        from: found,
                        to: current,
                        source,
                    })?;
                tracing::info!(
                    "migrated {} from version {} to {}",
                    path.display(),
                    found,
                    current
                );
                migrated
            }
            _ => raw,
        };

        let value = self
            .shape
            .validate(&raw)
            .map_err(|source| StoreError::ValidationFailed {
                path: path.to_path_buf(),
                version: self.current_version,
                source,
            })?;

        Ok((value, found))
    }

    /// Recovery policy for load-path failures
    fn recover(&self, err: StoreError, options: LoadOptions) -> StoreResult<S::Value> {
        match &self.default {
            Some(default) if !options.throw_on_error && err.is_recoverable() => {
                tracing::warn!(
                    kind = %err.kind(),
                    "using default value: {}",
                    err
                );
                Ok(default.produce())
            }
            _ => Err(err),
        }
    }
}

impl<S: Schema> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("format", &self.format.name())
            .field("current_version", &self.current_version)
            .field("chain", &self.chain.versions())
            .field("has_default", &self.default.is_some())
            .field("version_key", &self.envelope.key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, ErrorKind, FormatError, SchemaError, StorageError};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal JSON format for engine tests
    struct TestJson;

    impl Format for TestJson {
        fn name(&self) -> &str {
            "json"
        }

        fn extensions(&self) -> &[&str] {
            &["json"]
        }

        fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
            serde_json::from_slice(bytes).map_err(|e| FormatError::decode("json", e))
        }

        fn encode(&self, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, FormatError> {
            let out = if options.compact {
                serde_json::to_vec(value)
            } else {
                serde_json::to_vec_pretty(value)
            };
            out.map_err(|e| FormatError::encode("json", e))
        }
    }

    /// `{ "theme": string }`
    struct Theme;

    impl Schema for Theme {
        type Value = String;

        fn validate(&self, raw: &Value) -> Result<String, SchemaError> {
            match raw.as_object() {
                Some(map) if map.len() == 1 => map
                    .get("theme")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| SchemaError::at("/theme", "expected string")),
                _ => Err(SchemaError::message("expected exactly {theme}")),
            }
        }

        fn encode(&self, value: &String) -> Result<Value, SchemaError> {
            Ok(json!({ "theme": value }))
        }
    }

    /// v1 shape: `{ "dark": bool }`
    struct DarkFlag;

    impl Schema for DarkFlag {
        type Value = bool;

        fn validate(&self, raw: &Value) -> Result<bool, SchemaError> {
            raw.get("dark")
                .and_then(Value::as_bool)
                .ok_or_else(|| SchemaError::at("/dark", "expected boolean"))
        }

        fn encode(&self, value: &bool) -> Result<Value, SchemaError> {
            Ok(json!({ "dark": value }))
        }
    }

    fn dark_to_theme(calls: &Arc<AtomicUsize>) -> MigrationStep {
        let calls = Arc::clone(calls);
        MigrationStep::sync(1, DarkFlag, move |dark: bool| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(json!({ "theme": if dark { "dark" } else { "light" } }))
        })
    }

    fn versioned_store(calls: &Arc<AtomicUsize>, storage: &MemoryStorage) -> Store<Theme> {
        let config = StoreConfig::new(Theme)
            .with_version(2)
            .with_migration(dark_to_theme(calls));
        Store::new(config, TestJson)
            .unwrap()
            .with_storage(storage.clone())
    }

    /// Counts reads and optionally fails writes
    struct CountingStorage {
        inner: MemoryStorage,
        reads: AtomicUsize,
        fail_writes: bool,
    }

    #[async_trait]
    impl Storage for CountingStorage {
        async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(path).await
        }

        async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::from_io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            self.inner.write(path, bytes).await
        }
    }

    #[test]
    fn invalid_chain_fails_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = StoreConfig::new(Theme)
            .with_version(3)
            .with_migration(dark_to_theme(&calls));

        let err = Store::new(config, TestJson).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainInvalid);
    }

    #[test]
    fn migrations_without_version_fail_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = StoreConfig::new(Theme).with_migration(dark_to_theme(&calls));

        let err = Store::new(config, TestJson).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChainInvalid);
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        let store = versioned_store(&calls, &storage);

        store
            .save(&"dark".to_string(), "s.json", SaveOptions::default())
            .await
            .unwrap();
        let loaded = store.load("s.json", LoadOptions::default()).await.unwrap();

        assert_eq!(loaded, "dark");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn versioned_save_emits_exactly_one_tag() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        let store = versioned_store(&calls, &storage);

        store
            .save(&"light".to_string(), "s.json", SaveOptions::compact())
            .await
            .unwrap();

        let text = storage.get_string("s.json").unwrap();
        assert_eq!(text, r#"{"_version":2,"theme":"light"}"#);
    }

    #[tokio::test]
    async fn unversioned_save_emits_no_tag() {
        let storage = MemoryStorage::new();
        let store = Store::new(StoreConfig::new(Theme), TestJson)
            .unwrap()
            .with_storage(storage.clone());

        store
            .save(&"light".to_string(), "s.json", SaveOptions::compact())
            .await
            .unwrap();

        assert_eq!(storage.get_string("s.json").unwrap(), r#"{"theme":"light"}"#);
    }

    #[tokio::test]
    async fn older_file_is_migrated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        storage.insert("s.json", r#"{"_version":1,"dark":true}"#);
        let store = versioned_store(&calls, &storage);

        let loaded = store.load("s.json", LoadOptions::strict()).await.unwrap();

        assert_eq!(loaded, "dark");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn newer_file_is_unsupported_and_never_migrated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        storage.insert("s.json", r#"{"_version":3,"theme":"dark"}"#);
        let store = versioned_store(&calls, &storage);

        let err = store.load("s.json", LoadOptions::strict()).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::UnsupportedVersion {
                found: 3,
                supported: 2,
                ..
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_without_default_always_surface() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = versioned_store(&calls, &MemoryStorage::new());

        let err = store.load("absent.json", LoadOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReadFailed);
    }

    #[tokio::test]
    async fn default_covers_every_load_failure() {
        let cases = [
            ("missing.json", None, ErrorKind::ReadFailed),
            ("garbage.json", Some("{not json"), ErrorKind::DecodeFailed),
            ("untagged.json", Some(r#"{"theme":"dark"}"#), ErrorKind::InvalidVersionTag),
            ("zero.json", Some(r#"{"_version":0,"theme":"dark"}"#), ErrorKind::InvalidVersionTag),
            ("future.json", Some(r#"{"_version":9,"theme":"dark"}"#), ErrorKind::UnsupportedVersion),
            ("bad-v1.json", Some(r#"{"_version":1,"dark":"yes"}"#), ErrorKind::MigrationFailed),
            ("bad-v2.json", Some(r#"{"_version":2,"theme":7}"#), ErrorKind::ValidationFailed),
        ];

        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        for (path, contents, _) in &cases {
            if let Some(contents) = contents {
                storage.insert(*path, *contents);
            }
        }
        let store = Store::new(
            StoreConfig::new(Theme)
                .with_version(2)
                .with_migration(dark_to_theme(&calls))
                .with_default("light".to_string()),
            TestJson,
        )
        .unwrap()
        .with_storage(storage);

        for (path, _, kind) in cases {
            let soft = store.load(path, LoadOptions::default()).await.unwrap();
            assert_eq!(soft, "light", "{path} should fall back");

            let hard = store.load(path, LoadOptions::strict()).await.unwrap_err();
            assert_eq!(hard.kind(), kind, "{path}");
        }
    }

    #[tokio::test]
    async fn producer_default_runs_per_fallback() {
        let counter = Arc::new(AtomicUsize::new(0));
        let produced = Arc::clone(&counter);
        let store = Store::new(
            StoreConfig::new(Theme).with_default_fn(move || {
                format!("theme-{}", produced.fetch_add(1, Ordering::SeqCst))
            }),
            TestJson,
        )
        .unwrap()
        .with_storage(MemoryStorage::new());

        let first = store.load("none.json", LoadOptions::default()).await.unwrap();
        let second = store.load("none.json", LoadOptions::default()).await.unwrap();

        assert_eq!(first, "theme-0");
        assert_eq!(second, "theme-1");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn every_load_rereads_storage() {
        let inner = MemoryStorage::new();
        inner.insert("s.json", r#"{"theme":"dark"}"#);
        let storage = Arc::new(CountingStorage {
            inner,
            reads: AtomicUsize::new(0),
            fail_writes: false,
        });
        let store = Store::new(StoreConfig::new(Theme), TestJson)
            .unwrap()
            .with_storage(Arc::clone(&storage));

        store.load("s.json", LoadOptions::default()).await.unwrap();
        store.load("s.json", LoadOptions::default()).await.unwrap();

        assert_eq!(storage.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn write_failure_is_fatal_even_with_default() {
        let storage = CountingStorage {
            inner: MemoryStorage::new(),
            reads: AtomicUsize::new(0),
            fail_writes: true,
        };
        let store = Store::new(
            StoreConfig::new(Theme).with_default("light".to_string()),
            TestJson,
        )
        .unwrap()
        .with_storage(storage);

        let err = store
            .save(&"dark".to_string(), "s.json", SaveOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFailed);
    }

    #[tokio::test]
    async fn encoding_failure_is_fatal() {
        struct Unencodable;

        impl Schema for Unencodable {
            type Value = ();

            fn validate(&self, _raw: &Value) -> Result<(), SchemaError> {
                Ok(())
            }

            fn encode(&self, _value: &()) -> Result<Value, SchemaError> {
                Err(SchemaError::message("cannot encode"))
            }
        }

        let store = Store::new(StoreConfig::new(Unencodable), TestJson)
            .unwrap()
            .with_storage(MemoryStorage::new());

        let err = store.save(&(), "s.json", SaveOptions::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingFailed);
    }

    #[tokio::test]
    async fn inspect_reports_version_without_validating() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        storage.insert("s.json", r#"{"_version":1,"anything":"goes"}"#);
        let store = versioned_store(&calls, &storage);

        let info = store.inspect("s.json").await.unwrap();

        assert_eq!(info.version, Some(1));
        assert!(info.needs_migration());
        assert!(!info.is_newer_than_supported());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn migrate_file_writes_back_current_version() {
        let calls = Arc::new(AtomicUsize::new(0));
        let storage = MemoryStorage::new();
        storage.insert("s.json", r#"{"_version":1,"dark":false}"#);
        let store = versioned_store(&calls, &storage);

        let report = store
            .migrate_file("s.json", SaveOptions::compact())
            .await
            .unwrap();
        assert_eq!(report, Some(MigrationReport { from: 1, to: 2 }));
        assert_eq!(
            storage.get_string("s.json").unwrap(),
            r#"{"_version":2,"theme":"light"}"#
        );

        let again = store
            .migrate_file("s.json", SaveOptions::compact())
            .await
            .unwrap();
        assert_eq!(again, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_version_key_is_used_on_both_paths() {
        let storage = MemoryStorage::new();
        let store = Store::new(
            StoreConfig::new(Theme).with_version(1).with_version_key("schema"),
            TestJson,
        )
        .unwrap()
        .with_storage(storage.clone());

        store
            .save(&"dark".to_string(), "s.json", SaveOptions::compact())
            .await
            .unwrap();
        assert_eq!(
            storage.get_string("s.json").unwrap(),
            r#"{"schema":1,"theme":"dark"}"#
        );
        assert_eq!(store.load("s.json", LoadOptions::strict()).await.unwrap(), "dark");
    }
}
