//! Basic usage examples for Pool

use recycling_pool::{Pool, PoolConfiguration};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn main() {
    println!("=== Recycling pool - Basic Examples ===\n");

    // Example 1: Blocking pool seeded by hand
    seeded_pool();

    // Example 2: Generating pool with reset
    generating_pool();

    // Example 3: Surplus items shed on release
    surplus_shedding();

    // Example 4: Bounded waits
    bounded_waits();
}

fn seeded_pool() {
    println!("1. Seeded Pool:");
    let pool = Arc::new(Pool::with_capacity(2));
    pool.release("alpha");
    pool.release("beta");

    let first = pool.acquire();
    let second = pool.acquire();
    println!("   Got: {}, {}", first, second);

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.acquire())
    };

    thread::sleep(Duration::from_millis(50));
    println!("   Releasing {} for the waiting thread", first);
    pool.release(first);
    println!("   Waiter got: {}\n", waiter.join().unwrap());
}

fn generating_pool() {
    println!("2. Generating Pool:");
    let pool = Pool::new(
        2,
        PoolConfiguration::new()
            .with_factory(|| Vec::<u8>::with_capacity(1024))
            .with_reset(|buf: &mut Vec<u8>| buf.clear()),
    );

    {
        let mut buf = pool.checkout();
        buf.extend_from_slice(b"request body");
        println!("   Filled buffer with {} bytes", buf.len());
        // Buffer is reset and released when dropped
    }

    let buf = pool.acquire();
    println!("   Reused buffer: len {}, capacity {}\n", buf.len(), buf.capacity());
}

fn surplus_shedding() {
    println!("3. Surplus Shedding:");
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let pool = Pool::new(
        1,
        PoolConfiguration::new()
            .with_factory(move || counter.fetch_add(1, Ordering::Relaxed))
            .with_discard(),
    );

    let a = pool.acquire();
    let b = pool.acquire();
    println!("   Acquired ids {} and {} from a pool of 1", a, b);

    pool.release(a);
    pool.release(b);
    println!("   Free after release: {}", pool.available_count());
    println!("   Items built: {}\n", made.load(Ordering::Relaxed));
}

fn bounded_waits() {
    println!("4. Bounded Waits:");
    let pool = Pool::<u32>::with_capacity(1);

    match pool.acquire_timeout(Duration::from_millis(100)) {
        Ok(item) => println!("   Got {}", item),
        Err(e) => println!("   Error: {}", e),
    }

    pool.release(1);
    if let Err(e) = pool.release_timeout(2, Duration::from_millis(100)) {
        println!("   Error: {}", e);
        println!("   Handed back: {}", e.into_inner());
    }
}
