//! Migration runner
//!
//! Walks a value from its file version up to a target version, one step at a
//! time. Each step's input is checked against the shape that step declares
//! for its source version, so corrupt historical data is caught at the exact
//! version where it stops making sense.

use crate::chain::MigrationChain;
use crate::error::{BoxError, SchemaError};
use serde_json::Value;

/// Failure while running migrations, tagged with the version it happened at
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// No step migrates from this version
    #[error("no migration registered from version {version}")]
    MissingStep { version: u32 },

    /// Value did not match the step's source shape
    #[error("data at version {version} does not match that version's shape: {source}")]
    InvalidSource {
        version: u32,
        #[source]
        source: SchemaError,
    },

    /// The step's transform returned an error
    #[error("migration from version {version} to {} failed: {source}", .version + 1)]
    Transform {
        version: u32,
        #[source]
        source: BoxError,
    },
}

impl MigrationError {
    /// Version at which the run stopped
    #[must_use]
    pub fn version(&self) -> u32 {
        match self {
            Self::MissingStep { version }
            | Self::InvalidSource { version, .. }
            | Self::Transform { version, .. } => *version,
        }
    }
}

/// Migrate `value` from version `from` to version `to`
///
/// Steps run strictly in ascending order, each awaited to completion before
/// the next is looked up. The returned value is not validated against the
/// target shape.
///
/// # Errors
/// Stops at the first missing step, rejected input, or failed transform.
pub async fn run(
    mut value: Value,
    from: u32,
    to: u32,
    chain: &MigrationChain,
) -> Result<Value, MigrationError> {
    let mut version = from;

    while version < to {
        let step = chain
            .step(version)
            .ok_or(MigrationError::MissingStep { version })?;

        tracing::debug!("migrating from version {} to {}", version, version + 1);

        let pending = step
            .prepare(&value)
            .map_err(|source| MigrationError::InvalidSource { version, source })?;
        value = pending
            .await
            .map_err(|source| MigrationError::Transform { version, source })?;

        version += 1;
    }

    Ok(value)
}
