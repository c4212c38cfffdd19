//! Error types for the bounded-wait and cancellable pool operations

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why a waiting pool operation gave up.
///
/// The plain [`Pool::acquire`](crate::Pool::acquire) and
/// [`Pool::release`](crate::Pool::release) never fail; only their
/// timeout and cancellation variants return this.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation was cancelled")]
    Cancelled,
}

pub type PoolResult<T> = Result<T, PoolError>;

/// A release that could not complete, carrying the item back to the caller.
///
/// The reset function (if any) has already been applied to the item.
#[derive(Error)]
#[error("release failed: {reason}")]
pub struct ReleaseError<T> {
    reason: PoolError,
    item: T,
}

impl<T> ReleaseError<T> {
    pub(crate) fn new(reason: PoolError, item: T) -> Self {
        Self { reason, item }
    }

    /// Why the release gave up
    pub fn reason(&self) -> PoolError {
        self.reason
    }

    /// Take back the item that was not returned to the pool
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for ReleaseError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseError")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<T> From<ReleaseError<T>> for PoolError {
    fn from(err: ReleaseError<T>) -> Self {
        err.reason
    }
}
