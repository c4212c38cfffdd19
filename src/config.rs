//! Pool configuration options

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub(crate) type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;
pub(crate) type Reset<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// How [`Pool::acquire`](crate::Pool::acquire) behaves on an empty pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AcquireMode {
    /// Wait until another caller releases an item
    Block,

    /// Take a free item if there is one, otherwise build a new one with the factory
    GenerateOrReuse,
}

/// How [`Pool::release`](crate::Pool::release) behaves on a full pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReleaseMode {
    /// Wait until another caller acquires an item
    Block,

    /// Drop the item
    DiscardIfFull,
}

/// Acquire behavior resolved from the configuration.
///
/// The factory lives inside the generating variant, so a generating pool
/// without a factory cannot be expressed.
pub(crate) enum AcquireStrategy<T> {
    Block,
    GenerateOrReuse(Factory<T>),
}

impl<T> AcquireStrategy<T> {
    pub(crate) fn mode(&self) -> AcquireMode {
        match self {
            AcquireStrategy::Block => AcquireMode::Block,
            AcquireStrategy::GenerateOrReuse(_) => AcquireMode::GenerateOrReuse,
        }
    }
}

/// Configuration for pool behavior.
///
/// Options are applied in the order they are chained; setting the same
/// option twice keeps the last value. The configuration is consumed by
/// [`Pool::new`](crate::Pool::new), so a built pool can never be reconfigured.
///
/// # Examples
///
/// ```
/// use recycling_pool::{AcquireMode, PoolConfiguration, ReleaseMode};
///
/// let config = PoolConfiguration::new()
///     .with_factory(Vec::<u8>::new)
///     .with_reset(|buf: &mut Vec<u8>| buf.clear())
///     .with_discard();
///
/// assert_eq!(config.acquire_mode(), AcquireMode::GenerateOrReuse);
/// assert_eq!(config.release_mode(), ReleaseMode::DiscardIfFull);
/// ```
pub struct PoolConfiguration<T> {
    pub(crate) acquire: AcquireStrategy<T>,

    pub(crate) reset: Option<Reset<T>>,

    pub(crate) release_mode: ReleaseMode,

    /// How often async waiters re-check the pool
    pub(crate) poll_interval: Duration,
}

impl<T> Default for PoolConfiguration<T> {
    fn default() -> Self {
        Self {
            acquire: AcquireStrategy::Block,
            reset: None,
            release_mode: ReleaseMode::Block,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl<T> fmt::Debug for PoolConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("acquire_mode", &self.acquire_mode())
            .field("release_mode", &self.release_mode)
            .field("has_reset", &self.reset.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl<T> PoolConfiguration<T> {
    /// Create a new configuration with default values: block on acquire,
    /// block on release, no reset
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a factory to fill the pool on creation and to build a new item
    /// whenever `acquire` finds the pool empty.
    ///
    /// This switches the acquire mode to [`AcquireMode::GenerateOrReuse`].
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.acquire = AcquireStrategy::GenerateOrReuse(Box::new(factory));
        self
    }

    /// Reset every item before it goes back into the pool
    ///
    /// # Examples
    ///
    /// ```
    /// use recycling_pool::{Pool, PoolConfiguration};
    ///
    /// let pool = Pool::new(
    ///     1,
    ///     PoolConfiguration::new()
    ///         .with_factory(String::new)
    ///         .with_reset(String::clear),
    /// );
    ///
    /// let mut s = pool.acquire();
    /// s.push_str("dirty");
    /// pool.release(s);
    /// assert!(pool.acquire().is_empty());
    /// ```
    pub fn with_reset<F>(mut self, reset: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Drop released items instead of waiting when the pool is full
    pub fn with_discard(self) -> Self {
        self.with_release_mode(ReleaseMode::DiscardIfFull)
    }

    /// Set the release mode
    pub fn with_release_mode(mut self, mode: ReleaseMode) -> Self {
        self.release_mode = mode;
        self
    }

    /// Set how often the async operations re-check a pool they are waiting on
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get the acquire mode the factory setting selects
    pub fn acquire_mode(&self) -> AcquireMode {
        self.acquire.mode()
    }

    /// Get the configured release mode
    pub fn release_mode(&self) -> ReleaseMode {
        self.release_mode
    }
}
