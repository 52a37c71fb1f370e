//! Migration steps and construction-time chain verification
//!
//! A chain for current version `N` must hold exactly one step for every
//! source version `1..N`. [`MigrationChain::validate`] is the only place this
//! is checked; a built chain is trusted afterwards.

use crate::error::{BoxError, SchemaError};
use crate::schema::Schema;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Pending result of a step's transform
pub(crate) type TransformFuture = BoxFuture<'static, Result<Value, BoxError>>;

/// Type-erased step body: validate against the source shape, then hand the
/// typed value to the transform.
trait StepBody: Send + Sync {
    fn prepare(&self, value: &Value) -> Result<TransformFuture, SchemaError>;
}

struct ShapedStep<S, F> {
    shape: S,
    transform: F,
}

impl<S, F> StepBody for ShapedStep<S, F>
where
    S: Schema,
    F: Fn(S::Value) -> TransformFuture + Send + Sync,
{
    fn prepare(&self, value: &Value) -> Result<TransformFuture, SchemaError> {
        let validated = self.shape.validate(value)?;
        Ok((self.transform)(validated))
    }
}

/// One declared transformation from `source_version` to `source_version + 1`
///
/// The step owns the shape of its source version. Input is validated against
/// that shape before the transform runs; the transform's output is left
/// unvalidated (the next step, or the store's current shape, checks it).
pub struct MigrationStep {
    source_version: u32,
    body: Arc<dyn StepBody>,
}

impl MigrationStep {
    /// Create a step whose transform may suspend
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let step = MigrationStep::new(1, SerdeSchema::<V1>::new(), |old: V1| async move {
    ///     let stamp = clock.now().await;
    ///     Ok::<_, std::io::Error>(V2 { theme: old.theme, updated_at: stamp })
    /// });
    /// ```
    pub fn new<S, F, Fut, U, E>(source_version: u32, source_shape: S, transform: F) -> Self
    where
        S: Schema,
        F: Fn(S::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        U: Serialize + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let transform = move |value: S::Value| -> TransformFuture {
            let pending = transform(value);
            Box::pin(async move {
                let next = pending.await.map_err(Into::<BoxError>::into)?;
                serde_json::to_value(next).map_err(|e| Box::new(e) as BoxError)
            })
        };

        Self {
            source_version,
            body: Arc::new(ShapedStep {
                shape: source_shape,
                transform,
            }),
        }
    }

    /// Create a step with a synchronous transform
    ///
    /// Runs through the same awaiting path as [`MigrationStep::new`].
    pub fn sync<S, F, U, E>(source_version: u32, source_shape: S, transform: F) -> Self
    where
        S: Schema,
        F: Fn(S::Value) -> Result<U, E> + Send + Sync + 'static,
        U: Serialize + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self::new(source_version, source_shape, move |value| {
            futures::future::ready(transform(value))
        })
    }

    /// Version this step migrates from
    #[inline]
    #[must_use]
    pub fn source_version(&self) -> u32 {
        self.source_version
    }

    /// Version this step migrates to
    #[inline]
    #[must_use]
    pub fn target_version(&self) -> u32 {
        self.source_version.saturating_add(1)
    }

    /// Validate `value` against the source shape and start the transform
    pub(crate) fn prepare(&self, value: &Value) -> Result<TransformFuture, SchemaError> {
        self.body.prepare(value)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("source_version", &self.source_version)
            .finish_non_exhaustive()
    }
}

/// Reasons a migration chain is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Steps were supplied without a current version
    #[error("{steps} migration step(s) supplied but no current version is set")]
    VersionRequired { steps: usize },

    /// Current version must be at least 1
    #[error("current version must be at least 1, got {current}")]
    InvalidCurrentVersion { current: u32 },

    /// A step sits where a different source version was expected
    #[error(
        "migration at position {position} has source version {found}, expected {expected} \
         (chain must cover versions 1..{current} without gaps or duplicates)"
    )]
    OutOfSequence {
        position: usize,
        expected: u32,
        found: u32,
        current: u32,
    },

    /// The last step does not lead to the current version
    #[error("last migration must start at version {expected} to reach version {current}, found {found}")]
    WrongTail {
        expected: u32,
        found: u32,
        current: u32,
    },
}

/// A verified, gapless sequence of migration steps sorted by source version
#[derive(Debug, Default)]
pub struct MigrationChain {
    steps: Vec<MigrationStep>,
}

impl MigrationChain {
    /// Empty chain (nothing to migrate)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Verify that `steps` cover exactly `1..current_version`
    ///
    /// Checks, in order:
    /// 1. steps present without a current version
    /// 2. a current version of zero
    /// 3. after sorting, step `i` starts at version `i + 1`
    /// 4. the last step starts at `current_version - 1`
    ///
    /// An empty list is always accepted.
    ///
    /// # Errors
    /// Returns the first [`ChainError`] found.
    pub fn validate(
        current_version: Option<u32>,
        mut steps: Vec<MigrationStep>,
    ) -> Result<Self, ChainError> {
        let current = match current_version {
            None if !steps.is_empty() => {
                return Err(ChainError::VersionRequired { steps: steps.len() })
            }
            None => return Ok(Self::empty()),
            Some(0) => return Err(ChainError::InvalidCurrentVersion { current: 0 }),
            Some(current) => current,
        };

        steps.sort_by_key(MigrationStep::source_version);

        for (position, step) in steps.iter().enumerate() {
            let expected = u32::try_from(position + 1).unwrap_or(u32::MAX);
            if step.source_version != expected {
                return Err(ChainError::OutOfSequence {
                    position,
                    expected,
                    found: step.source_version,
                    current,
                });
            }
        }

        if let Some(last) = steps.last() {
            if last.source_version != current - 1 {
                return Err(ChainError::WrongTail {
                    expected: current - 1,
                    found: last.source_version,
                    current,
                });
            }
        }

        tracing::debug!(
            "migration chain verified: {} step(s) up to version {}",
            steps.len(),
            current
        );
        Ok(Self { steps })
    }

    /// Step migrating from `version`, if any
    #[must_use]
    pub fn step(&self, version: u32) -> Option<&MigrationStep> {
        self.steps
            .binary_search_by_key(&version, MigrationStep::source_version)
            .ok()
            .map(|idx| &self.steps[idx])
    }

    /// Source versions in ascending order
    #[must_use]
    pub fn versions(&self) -> Vec<u32> {
        self.steps.iter().map(MigrationStep::source_version).collect()
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the chain holds no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
