//! Async usage examples

use recycling_pool::{Pool, PoolConfiguration};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== Recycling pool - Async Examples ===\n");

    // Example 1: Async acquire and release
    async_round_trip().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;

    // Example 4: Cancel a wait with Ctrl-C
    cancel_on_interrupt().await;
}

async fn async_round_trip() {
    println!("1. Async Round Trip:");
    let pool = Pool::new(1, PoolConfiguration::new().with_factory(|| 42));

    let obj = pool.acquire_async().await;
    println!("   Got object asynchronously: {}", obj);
    pool.release_async(obj).await;

    println!("   Available after return: {}\n", pool.available_count());
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");
    let pool = Pool::<u32>::with_capacity(1);

    match tokio::time::timeout(Duration::from_millis(100), pool.acquire_async()).await {
        Ok(obj) => println!("   Got object: {}", obj),
        Err(_) => println!("   Timed out on an empty pool"),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let pool = Arc::new(Pool::with_capacity(3));
    for id in 1..=3 {
        pool.release(id);
    }

    let mut handles = vec![];

    for i in 0..10 {
        let pool_clone = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            let obj = pool_clone.acquire_async().await;
            println!("   Task {} got object: {}", i, obj);
            sleep(Duration::from_millis(20)).await;
            pool_clone.release_async(obj).await;
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final available: {}\n", pool.available_count());
}

async fn cancel_on_interrupt() {
    println!("4. Cancel on Interrupt:");
    let pool = Pool::<u32>::with_capacity(1);

    let stop = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sleep(Duration::from_millis(200)) => {}
        }
    };

    match pool.acquire_async_until(stop).await {
        Ok(obj) => println!("   Got object: {}", obj),
        Err(e) => println!("   Stopped waiting: {}", e),
    }
}
