//! Bounded, cancellable and async variants of acquire and release
//!
//! None of these change the pool's behavior. They only give a caller a way
//! out of a `Block` wait: a timeout, a cancellation channel, or (for async
//! callers) any future that completes when the wait should stop. Under
//! `GenerateOrReuse` acquire or `DiscardIfFull` release nothing ever waits,
//! so these always succeed.
//!
//! A free item (or free slot) always wins over a cancellation that is
//! already signaled.

use crate::config::{AcquireStrategy, ReleaseMode};
use crate::errors::{PoolError, PoolResult, ReleaseError};
use crate::pool::{Pool, disconnected};

use crossbeam::channel::{Receiver, RecvTimeoutError, Select, SendTimeoutError, TrySendError, select};
use std::future::Future;
use std::time::Duration;

impl<T> Pool<T> {
    /// Acquire an item, giving up after `timeout` if the pool stays empty
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<T> {
        match &self.acquire {
            AcquireStrategy::GenerateOrReuse(factory) => Ok(self.take_or_generate(factory)),
            AcquireStrategy::Block => match self.receiver.recv_timeout(timeout) {
                Ok(item) => Ok(item),
                Err(RecvTimeoutError::Timeout) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(?timeout, "Acquire timed out");
                    Err(PoolError::Timeout(timeout))
                }
                Err(RecvTimeoutError::Disconnected) => disconnected(),
            },
        }
    }

    /// Acquire an item, giving up when `cancel` receives a message or is
    /// disconnected.
    ///
    /// Dropping every sender of a `Receiver<()>` is the usual way to signal
    /// cancellation to any number of waiters at once.
    ///
    /// # Examples
    ///
    /// ```
    /// use crossbeam::channel;
    /// use recycling_pool::{Pool, PoolError};
    ///
    /// let pool = Pool::<u32>::with_capacity(1);
    /// let (stop, cancel) = channel::bounded::<()>(0);
    /// drop(stop);
    ///
    /// assert_eq!(pool.acquire_or_cancel(&cancel), Err(PoolError::Cancelled));
    /// ```
    pub fn acquire_or_cancel(&self, cancel: &Receiver<()>) -> PoolResult<T> {
        if let AcquireStrategy::GenerateOrReuse(factory) = &self.acquire {
            return Ok(self.take_or_generate(factory));
        }
        if let Ok(item) = self.receiver.try_recv() {
            return Ok(item);
        }

        select! {
            recv(self.receiver) -> item => match item {
                Ok(item) => Ok(item),
                Err(_) => disconnected(),
            },
            recv(cancel) -> _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Acquire cancelled");
                Err(PoolError::Cancelled)
            },
        }
    }

    /// Release an item, giving up after `timeout` if the pool stays full.
    ///
    /// The reset function runs before waiting; on timeout the reset item is
    /// handed back in the error.
    pub fn release_timeout(&self, mut item: T, timeout: Duration) -> Result<(), ReleaseError<T>> {
        self.apply_reset(&mut item);
        if self.release_mode == ReleaseMode::DiscardIfFull {
            self.put_or_discard(item);
            return Ok(());
        }

        match self.sender.send_timeout(item, timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(item)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(?timeout, "Release timed out");
                Err(ReleaseError::new(PoolError::Timeout(timeout), item))
            }
            Err(SendTimeoutError::Disconnected(_)) => disconnected(),
        }
    }

    /// Release an item, giving up when `cancel` receives a message or is
    /// disconnected. On cancellation the reset item is handed back.
    pub fn release_or_cancel(&self, mut item: T, cancel: &Receiver<()>) -> Result<(), ReleaseError<T>> {
        self.apply_reset(&mut item);
        if self.release_mode == ReleaseMode::DiscardIfFull {
            self.put_or_discard(item);
            return Ok(());
        }

        let item = match self.sender.try_send(item) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(item)) => item,
            Err(TrySendError::Disconnected(_)) => disconnected(),
        };

        // The item only moves into the channel if the send is the operation
        // that gets selected.
        let mut sel = Select::new();
        let send_index = sel.send(&self.sender);
        sel.recv(cancel);
        let oper = sel.select();

        if oper.index() == send_index {
            match oper.send(&self.sender, item) {
                Ok(()) => Ok(()),
                Err(_) => disconnected(),
            }
        } else {
            let _ = oper.recv(cancel);
            #[cfg(feature = "tracing")]
            tracing::debug!("Release cancelled");
            Err(ReleaseError::new(PoolError::Cancelled, item))
        }
    }

    /// Acquire an item from an async task.
    ///
    /// A `Block` pool is re-checked every poll interval (see
    /// [`PoolConfiguration::with_poll_interval`](crate::PoolConfiguration::with_poll_interval))
    /// without tying up a runtime thread. Wrap it in `tokio::time::timeout`
    /// for a bounded wait.
    pub async fn acquire_async(&self) -> T {
        match &self.acquire {
            AcquireStrategy::GenerateOrReuse(factory) => self.take_or_generate(factory),
            AcquireStrategy::Block => loop {
                if let Ok(item) = self.receiver.try_recv() {
                    return item;
                }
                tokio::time::sleep(self.poll_interval).await;
            },
        }
    }

    /// Acquire an item from an async task, giving up when `cancel` completes.
    ///
    /// # Examples
    ///
    /// ```
    /// use recycling_pool::{Pool, PoolError};
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let pool = Pool::<u32>::with_capacity(1);
    /// let result = pool
    ///     .acquire_async_until(tokio::time::sleep(Duration::from_millis(20)))
    ///     .await;
    /// assert_eq!(result, Err(PoolError::Cancelled));
    /// # }
    /// ```
    pub async fn acquire_async_until<F>(&self, cancel: F) -> PoolResult<T>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            item = self.acquire_async() => Ok(item),
            _ = cancel => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Async acquire cancelled");
                Err(PoolError::Cancelled)
            }
        }
    }

}

impl<T: Send + 'static> Pool<T> {
    /// Release an item from an async task, re-checking a full `Block` pool
    /// every poll interval.
    ///
    /// A zero-capacity pool never has room to re-check for, so there each
    /// attempt waits up to one poll interval on a blocking thread for an
    /// acquirer (sync or async) to take the item.
    pub async fn release_async(&self, item: T) {
        // `pending` never completes, so this cannot come back with the item.
        let _ = self
            .release_async_until(item, std::future::pending::<()>())
            .await;
    }

    /// Release an item from an async task, giving up when `cancel`
    /// completes. On cancellation the reset item is handed back.
    pub async fn release_async_until<F>(&self, mut item: T, cancel: F) -> Result<(), ReleaseError<T>>
    where
        F: Future,
    {
        self.apply_reset(&mut item);
        if self.release_mode == ReleaseMode::DiscardIfFull {
            self.put_or_discard(item);
            return Ok(());
        }

        tokio::pin!(cancel);
        loop {
            item = match self.sender.try_send(item) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => back,
                Err(TrySendError::Disconnected(_)) => disconnected(),
            };

            if self.capacity() == 0 {
                tokio::select! {
                    biased;
                    _ = &mut cancel => return Err(release_cancelled(item)),
                    _ = std::future::ready(()) => {}
                }
                match self.hand_off(item).await {
                    Some(back) => item = back,
                    None => return Ok(()),
                }
            } else {
                tokio::select! {
                    biased;
                    _ = &mut cancel => return Err(release_cancelled(item)),
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }
    }

    /// Offer the item to an acquirer for one poll interval, parked on a
    /// blocking thread. Returns the item if nobody took it.
    async fn hand_off(&self, item: T) -> Option<T> {
        let sender = self.sender.clone();
        let wait = self.poll_interval;
        match tokio::task::spawn_blocking(move || sender.send_timeout(item, wait)).await {
            Ok(Ok(())) => None,
            Ok(Err(SendTimeoutError::Timeout(item))) => Some(item),
            Ok(Err(SendTimeoutError::Disconnected(_))) => disconnected(),
            Err(err) => match err.try_into_panic() {
                Ok(panic) => std::panic::resume_unwind(panic),
                // The runtime shut down before the task ran; the item went with it.
                Err(_) => None,
            },
        }
    }
}

fn release_cancelled<T>(item: T) -> ReleaseError<T> {
    #[cfg(feature = "tracing")]
    tracing::debug!("Async release cancelled");
    ReleaseError::new(PoolError::Cancelled, item)
}
