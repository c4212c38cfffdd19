//! # Recycling pool
//!
//! Bounded, thread-safe object pool with pluggable acquire and release
//! strategies.
//!
//! ## Features
//!
//! - Fixed capacity, set once at construction
//! - Blocking acquire, or reuse-else-generate acquire with a factory
//! - Blocking release, or discard-if-full release
//! - Optional reset of every item before it is reused
//! - Automatic release via RAII (`PooledObject`)
//! - Timeout, cancellation and async variants for blocking pools
//!
//! ## Quick Start
//!
//! ```rust
//! use recycling_pool::{Pool, PoolConfiguration};
//!
//! let pool = Pool::new(
//!     4,
//!     PoolConfiguration::new()
//!         .with_factory(|| String::with_capacity(64))
//!         .with_reset(String::clear)
//!         .with_discard(),
//! );
//!
//! let mut line = pool.acquire();
//! line.push_str("hello");
//! pool.release(line);
//!
//! assert_eq!(pool.available_count(), 4);
//! assert!(pool.acquire().is_empty());
//! ```
//!
//! ## Sharing between threads
//!
//! ```rust
//! use recycling_pool::Pool;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let pool = Arc::new(Pool::with_capacity(1));
//! pool.release(0u64);
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let pool = Arc::clone(&pool);
//!         thread::spawn(move || {
//!             let n = pool.acquire();
//!             pool.release(n + 1);
//!         })
//!     })
//!     .collect();
//!
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! assert_eq!(pool.acquire(), 4);
//! ```

mod config;
mod errors;
mod pool;
mod wait;

pub use config::{AcquireMode, PoolConfiguration, ReleaseMode};
pub use errors::{PoolError, PoolResult, ReleaseError};
pub use pool::{Pool, PooledObject};
