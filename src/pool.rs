//! Core pool implementation

use crate::config::{AcquireMode, AcquireStrategy, Factory, PoolConfiguration, ReleaseMode, Reset};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

const HELD: &str = "PooledObject holds its item until detach or drop";

/// Borrowing guard from [`Pool::checkout`], releasing its item on drop
pub struct PooledObject<'a, T> {
    // Only `None` once `detach` or `drop` has taken the item out.
    item: Option<T>,
    pool: &'a Pool<T>,
}

impl<'a, T> PooledObject<'a, T> {
    fn new(item: T, pool: &'a Pool<T>) -> Self {
        Self {
            item: Some(item),
            pool,
        }
    }

    /// Keep the item instead of releasing it to the pool
    pub fn detach(mut self) -> T {
        self.item.take().expect(HELD)
    }

    /// The pool this item will be released to
    pub fn pool(&self) -> &'a Pool<T> {
        self.pool
    }
}

impl<T> Deref for PooledObject<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect(HELD)
    }
}

impl<T> DerefMut for PooledObject<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect(HELD)
    }
}

impl<T> Drop for PooledObject<'_, T> {
    fn drop(&mut self) {
        let Some(item) = self.item.take() else {
            return;
        };
        self.pool.release(item);
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("item", &self.item)
            .field("capacity", &self.pool.capacity())
            .finish()
    }
}

/// Thread-safe pool holding up to `capacity` free items.
///
/// Acquire and release behavior is fixed at construction by a
/// [`PoolConfiguration`]:
///
/// | acquire mode      | empty pool                                  |
/// |-------------------|---------------------------------------------|
/// | `Block`           | wait for a release                          |
/// | `GenerateOrReuse` | build a new item with the factory           |
///
/// | release mode      | full pool                                   |
/// |-------------------|---------------------------------------------|
/// | `Block`           | wait for an acquire                         |
/// | `DiscardIfFull`   | drop the item                               |
///
/// The pool only owns its free items; an acquired item belongs to the caller
/// until it is released.
///
/// # Liveness
///
/// A `Block` pool without a factory starts empty and must be seeded with
/// [`release`](Self::release). `acquire` on an empty `Block` pool, or
/// `release` on a full one, waits forever if no other caller makes progress.
/// Use the bounded variants ([`acquire_timeout`](Self::acquire_timeout),
/// [`acquire_or_cancel`](Self::acquire_or_cancel) and friends) where that
/// matters.
///
/// # Examples
///
/// ```
/// use recycling_pool::Pool;
///
/// let pool = Pool::with_capacity(2);
/// pool.release(1);
/// pool.release(2);
///
/// assert_eq!(pool.acquire(), 1);
/// assert_eq!(pool.acquire(), 2);
/// ```
pub struct Pool<T> {
    pub(crate) sender: Sender<T>,
    pub(crate) receiver: Receiver<T>,
    pub(crate) acquire: AcquireStrategy<T>,
    reset: Option<Reset<T>>,
    pub(crate) release_mode: ReleaseMode,
    pub(crate) poll_interval: Duration,
    capacity: usize,
}

impl<T> Pool<T> {
    /// Create a new pool with the given capacity and configuration.
    ///
    /// With a factory the pool is filled with `capacity` new items before
    /// this returns; otherwise it starts empty.
    ///
    /// A capacity of zero is allowed. Such a pool never holds a free item:
    /// a release can only hand its item straight to an acquirer that is
    /// already waiting. The async release variants wait on a blocking
    /// thread in that case so an async acquirer can meet them.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycling_pool::{Pool, PoolConfiguration};
    ///
    /// let pool = Pool::new(3, PoolConfiguration::new().with_factory(|| 0u64));
    /// assert_eq!(pool.available_count(), 3);
    /// ```
    pub fn new(capacity: usize, config: PoolConfiguration<T>) -> Self {
        let (sender, receiver) = channel::bounded(capacity);
        let PoolConfiguration {
            acquire,
            reset,
            release_mode,
            poll_interval,
        } = config;

        let pool = Self {
            sender,
            receiver,
            acquire,
            reset,
            release_mode,
            poll_interval,
            capacity,
        };

        if let AcquireStrategy::GenerateOrReuse(factory) = &pool.acquire {
            for _ in 0..capacity {
                if pool.sender.try_send(factory()).is_err() {
                    break;
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            capacity,
            acquire_mode = ?pool.acquire_mode(),
            release_mode = ?pool.release_mode,
            prefilled = pool.receiver.len(),
            "Created pool"
        );

        pool
    }

    /// Create a pool that blocks on both ends and starts empty
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity, PoolConfiguration::default())
    }

    /// Take an item from the pool.
    ///
    /// Under [`AcquireMode::Block`] this waits until an item is free. Under
    /// [`AcquireMode::GenerateOrReuse`] it never waits: a free item is
    /// reused, otherwise the factory builds a new one. Items built this way
    /// may push the number of items in circulation above the capacity.
    ///
    /// A panic in the factory propagates to the caller.
    pub fn acquire(&self) -> T {
        match &self.acquire {
            AcquireStrategy::Block => self.take_blocking(),
            AcquireStrategy::GenerateOrReuse(factory) => self.take_or_generate(factory),
        }
    }

    /// Return an item to the pool.
    ///
    /// The reset function, if configured, runs first. Then under
    /// [`ReleaseMode::Block`] this waits until there is room; under
    /// [`ReleaseMode::DiscardIfFull`] a full pool drops the item.
    ///
    /// A panic in the reset function propagates to the caller.
    pub fn release(&self, mut item: T) {
        self.apply_reset(&mut item);
        match self.release_mode {
            ReleaseMode::Block => self.put_blocking(item),
            ReleaseMode::DiscardIfFull => self.put_or_discard(item),
        }
    }

    /// Acquire an item wrapped in a guard that releases it on drop.
    ///
    /// The drop follows the release mode, so under [`ReleaseMode::Block`]
    /// it waits if other callers have filled the pool in the meantime.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycling_pool::{Pool, PoolConfiguration};
    ///
    /// let pool = Pool::new(
    ///     1,
    ///     PoolConfiguration::new()
    ///         .with_factory(Vec::new)
    ///         .with_reset(|v: &mut Vec<u8>| v.clear()),
    /// );
    ///
    /// {
    ///     let mut buf = pool.checkout();
    ///     buf.extend_from_slice(b"scratch");
    /// }
    ///
    /// assert_eq!(pool.available_count(), 1);
    /// assert!(pool.acquire().is_empty());
    /// ```
    pub fn checkout(&self) -> PooledObject<'_, T> {
        PooledObject::new(self.acquire(), self)
    }

    /// Take a free item without waiting and without calling the factory
    pub fn try_acquire(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Reset the item and put it back without waiting.
    ///
    /// Unlike `release`, a full pool hands the item back instead of
    /// dropping it, whatever the release mode.
    pub fn try_release(&self, mut item: T) -> Result<(), T> {
        self.apply_reset(&mut item);
        self.sender.try_send(item).map_err(TrySendError::into_inner)
    }

    /// Get the capacity of the pool
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of free items.
    ///
    /// Other callers may change this at any time, so treat it as a hint.
    pub fn available_count(&self) -> usize {
        self.receiver.len()
    }

    /// Whether there are no free items right now
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Whether the free list is at capacity right now
    pub fn is_full(&self) -> bool {
        self.receiver.is_full()
    }

    /// Get the acquire mode fixed at construction
    pub fn acquire_mode(&self) -> AcquireMode {
        self.acquire.mode()
    }

    /// Get the release mode fixed at construction
    pub fn release_mode(&self) -> ReleaseMode {
        self.release_mode
    }

    /// Whether released items are reset before reuse
    pub fn has_reset(&self) -> bool {
        self.reset.is_some()
    }

    pub(crate) fn apply_reset(&self, item: &mut T) {
        if let Some(reset) = &self.reset {
            reset(item);
        }
    }

    fn take_blocking(&self) -> T {
        match self.receiver.recv() {
            Ok(item) => item,
            Err(_) => disconnected(),
        }
    }

    pub(crate) fn take_or_generate(&self, factory: &Factory<T>) -> T {
        match self.receiver.try_recv() {
            Ok(item) => item,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(capacity = self.capacity, "Pool empty, generating item");
                factory()
            }
        }
    }

    fn put_blocking(&self, item: T) {
        if self.sender.send(item).is_err() {
            disconnected()
        }
    }

    pub(crate) fn put_or_discard(&self, item: T) {
        match self.sender.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(capacity = self.capacity, "Pool full, discarding item");
            }
            Err(TrySendError::Disconnected(_)) => disconnected(),
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("available", &self.available_count())
            .field("acquire_mode", &self.acquire_mode())
            .field("release_mode", &self.release_mode)
            .field("has_reset", &self.has_reset())
            .finish()
    }
}

/// The pool owns both ends of its channel, so it can never disconnect.
pub(crate) fn disconnected() -> ! {
    unreachable!("pool channel disconnected while the pool is alive")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::RecvTimeoutError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Data {
        id: usize,
        value: i32,
    }

    fn counting_factory() -> (Arc<AtomicUsize>, impl Fn() -> Data + Send + Sync + 'static) {
        let made = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&made);
        let factory = move || Data {
            id: counter.fetch_add(1, Ordering::SeqCst),
            value: 0,
        };
        (made, factory)
    }

    #[test]
    fn test_factory_prefills_pool() {
        let (made, factory) = counting_factory();
        let pool = Pool::new(4, PoolConfiguration::new().with_factory(factory));

        assert_eq!(made.load(Ordering::SeqCst), 4);
        assert_eq!(pool.available_count(), 4);
        assert!(pool.is_full());
        assert_eq!(pool.acquire_mode(), AcquireMode::GenerateOrReuse);
    }

    #[test]
    fn test_generate_only_when_empty() {
        let (made, factory) = counting_factory();
        let pool = Pool::new(3, PoolConfiguration::new().with_factory(factory));

        let ids: Vec<usize> = (0..3).map(|_| pool.acquire().id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(made.load(Ordering::SeqCst), 3);

        let extra = pool.acquire();
        assert_eq!(extra.id, 3);
        assert_eq!(made.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_block_pool_starts_empty() {
        let pool = Pool::<Data>::with_capacity(2);
        assert!(pool.is_empty());
        assert_eq!(pool.acquire_mode(), AcquireMode::Block);
        assert_eq!(pool.release_mode(), ReleaseMode::Block);
        assert!(pool.try_acquire().is_none());
    }

    #[test]
    fn test_seeded_block_pool_hands_out_capacity_then_waits() {
        let pool = Arc::new(Pool::with_capacity(3));
        for id in 0..3 {
            pool.release(Data { id, value: 0 });
        }
        assert!(pool.is_full());

        let held: Vec<Data> = (0..3).map(|_| pool.acquire()).collect();
        assert_eq!(held.iter().map(|d| d.id).collect::<Vec<_>>(), vec![0, 1, 2]);

        let (tx, rx) = channel::bounded(1);
        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || tx.send(pool.acquire()).unwrap())
        };

        assert_eq!(
            rx.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        );

        let mut held = held.into_iter();
        pool.release(held.next().unwrap());
        let got = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(got.id, 0);
        waiter.join().unwrap();
    }

    #[test]
    fn test_release_blocks_when_full() {
        let pool = Arc::new(Pool::with_capacity(1));
        pool.release(1);

        let (tx, rx) = channel::bounded(1);
        let releaser = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                pool.release(2);
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(pool.acquire(), 1);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        releaser.join().unwrap();
        assert_eq!(pool.acquire(), 2);
    }

    #[test]
    fn test_reset_applied_on_release() {
        let pool = Pool::new(
            1,
            PoolConfiguration::new()
                .with_factory(Data::default)
                .with_reset(|d: &mut Data| d.value = 0),
        );
        assert!(pool.has_reset());

        let mut x = pool.acquire();
        x.value = 1;
        pool.release(x);

        let x = pool.acquire();
        assert_eq!(x.value, 0);
    }

    #[test]
    fn test_reset_runs_once_per_release() {
        let resets = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&resets);
        let pool = Pool::new(
            2,
            PoolConfiguration::new()
                .with_reset(move |_: &mut u32| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .with_discard(),
        );

        pool.release(1);
        pool.release(2);
        pool.release(3);
        assert_eq!(resets.load(Ordering::SeqCst), 3);
        assert_eq!(pool.available_count(), 2);
    }

    #[test]
    fn test_discard_when_full() {
        let pool = Pool::new(
            1,
            PoolConfiguration::new()
                .with_factory(|| Data { id: 0, value: 1 })
                .with_discard(),
        );
        assert_eq!(pool.release_mode(), ReleaseMode::DiscardIfFull);

        pool.release(Data { id: 9, value: 2 });
        assert_eq!(pool.acquire().value, 1);
        assert_eq!(pool.acquire().value, 1);
    }

    #[test]
    fn test_discarded_item_is_unrecoverable() {
        let (_, factory) = counting_factory();
        let pool = Pool::new(2, PoolConfiguration::new().with_factory(factory).with_discard());

        pool.release(Data { id: 99, value: 0 });
        let first = pool.acquire();
        let second = pool.acquire();
        assert_eq!((first.id, second.id), (0, 1));
    }

    #[test]
    fn test_two_waiters_share_single_item() {
        let pool = Arc::new(Pool::with_capacity(1));
        pool.release("A");

        let (tx, rx) = channel::unbounded();
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let tx = tx.clone();
                thread::spawn(move || tx.send(pool.acquire()).unwrap())
            })
            .collect();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, "A");
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        );

        pool.release(first);
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second, "A");

        for worker in workers {
            worker.join().unwrap();
        }
    }

    #[test]
    fn test_surplus_is_shed_on_release() {
        let (made, factory) = counting_factory();
        let pool = Pool::new(1, PoolConfiguration::new().with_factory(factory).with_discard());

        let (a, b) = thread::scope(|s| {
            let a = s.spawn(|| pool.acquire());
            let b = s.spawn(|| pool.acquire());
            (a.join().unwrap(), b.join().unwrap())
        });

        let mut ids = [a.id, b.id];
        ids.sort();
        assert_eq!(ids, [0, 1]);
        assert_eq!(made.load(Ordering::SeqCst), 2);

        pool.release(a);
        pool.release(b);
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_zero_capacity_generating_pool() {
        let (made, factory) = counting_factory();
        let pool = Pool::new(0, PoolConfiguration::new().with_factory(factory).with_discard());

        assert_eq!(made.load(Ordering::SeqCst), 0);
        let item = pool.acquire();
        assert_eq!(item.id, 0);
        pool.release(item);
        assert_eq!(pool.available_count(), 0);
        assert_eq!(pool.acquire().id, 1);
    }

    #[test]
    fn test_try_release_hands_back_when_full() {
        let pool = Pool::new(1, PoolConfiguration::new().with_reset(|v: &mut i32| *v = 0));
        assert_eq!(pool.try_release(5), Ok(()));
        assert_eq!(pool.try_release(7), Err(0));
        assert_eq!(pool.try_acquire(), Some(0));
    }

    #[test]
    fn test_try_acquire_skips_factory() {
        let (made, factory) = counting_factory();
        let pool = Pool::new(1, PoolConfiguration::new().with_factory(factory));

        assert!(pool.try_acquire().is_some());
        assert!(pool.try_acquire().is_none());
        assert_eq!(made.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_checkout_returns_on_drop() {
        let pool = Pool::new(
            1,
            PoolConfiguration::new()
                .with_factory(Data::default)
                .with_reset(|d: &mut Data| d.value = 0),
        );

        {
            let mut obj = pool.checkout();
            obj.value = 42;
            assert_eq!(pool.available_count(), 0);
        }

        assert_eq!(pool.available_count(), 1);
        assert_eq!(pool.acquire().value, 0);
    }

    #[test]
    fn test_detach_keeps_item_out() {
        let pool = Pool::new(1, PoolConfiguration::new().with_factory(|| 5u8));
        let obj = pool.checkout();
        assert_eq!(*obj, 5);
        assert_eq!(obj.pool().capacity(), 1);
        let value = obj.detach();
        assert_eq!(value, 5);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_factory_panic_propagates() {
        let pool = Pool::new(
            0,
            PoolConfiguration::<u8>::new().with_factory(|| panic!("broken factory")),
        );
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pool.acquire()));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_output() {
        let pool = Pool::<u8>::with_capacity(3);
        let text = format!("{pool:?}");
        assert!(text.contains("capacity: 3"));
        assert!(text.contains("available: 0"));
    }
}
