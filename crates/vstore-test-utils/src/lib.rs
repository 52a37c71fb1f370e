//! Testing utilities for the vstore workspace
//!
//! Shared fixtures: a three-version settings history with a recording
//! migration chain, storage that fails on demand, and counting defaults.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use vstore_core::{MemoryStorage, MigrationStep, Storage, StorageError, StoreConfig};
use vstore_schema::{codec, SerdeSchema};

/// Version 1: a single flag, stored as a lowercase string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsV1 {
    #[serde(with = "codec::lowercase_bool")]
    pub dark: bool,
}

/// Version 2: named theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsV2 {
    pub theme: String,
}

/// Version 3 (current): theme plus font size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub theme: String,
    pub font_size: u32,
}

impl Settings {
    pub fn new(theme: &str, font_size: u32) -> Self {
        Self {
            theme: theme.to_string(),
            font_size,
        }
    }
}

pub const CURRENT_VERSION: u32 = 3;
pub const DEFAULT_FONT_SIZE: u32 = 14;

pub fn default_settings() -> Settings {
    Settings::new("light", DEFAULT_FONT_SIZE)
}

/// Source versions of every migration step run, in order
#[derive(Debug, Clone, Default)]
pub struct MigrationLog(Arc<Mutex<Vec<u32>>>);

impl MigrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, version: u32) {
        self.0.lock().push(version);
    }

    pub fn entries(&self) -> Vec<u32> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Steps 1 and 2 of the settings history, recording into `log`
///
/// Step 2 awaits a yield so the chain mixes synchronous and suspending steps.
pub fn settings_chain(log: &MigrationLog) -> Vec<MigrationStep> {
    let first = log.clone();
    let second = log.clone();
    vec![
        MigrationStep::sync(1, SerdeSchema::<SettingsV1>::new(), move |old: SettingsV1| {
            first.record(1);
            let theme = if old.dark { "dark" } else { "light" };
            Ok::<_, io::Error>(SettingsV2 {
                theme: theme.to_string(),
            })
        }),
        MigrationStep::new(2, SerdeSchema::<SettingsV2>::new(), move |old: SettingsV2| {
            let log = second.clone();
            async move {
                tokio::task::yield_now().await;
                log.record(2);
                Ok::<_, io::Error>(Settings {
                    theme: old.theme,
                    font_size: DEFAULT_FONT_SIZE,
                })
            }
        }),
    ]
}

/// Current-version settings config with the full chain and no default
pub fn settings_config(log: &MigrationLog) -> StoreConfig<SerdeSchema<Settings>> {
    StoreConfig::new(SerdeSchema::<Settings>::new())
        .with_version(CURRENT_VERSION)
        .with_migrations(settings_chain(log))
}

/// Default producer returning a fresh counter value per call
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicU32>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings whose font size is the call number, starting at 1
    pub fn next_settings(&self) -> Settings {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Settings::new("light", n)
    }

    pub fn calls(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Memory storage that can be told to fail reads or writes
#[derive(Debug, Clone, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingStorage {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            fail_reads: false,
            fail_writes: false,
        }
    }

    #[must_use]
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

fn denied(path: &Path) -> StorageError {
    StorageError::from_io(
        path,
        io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
    )
}

#[async_trait]
impl Storage for FailingStorage {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        if self.fail_reads {
            return Err(denied(path));
        }
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(denied(path));
        }
        self.inner.write(path, bytes).await
    }
}
