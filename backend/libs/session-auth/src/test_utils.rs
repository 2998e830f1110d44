//! Test helpers for the Redis-backed ledger
//!
//! Redis tests skip when no server is reachable.

use redis_utils::{RedisPool, SharedConnectionManager};
use std::env;
use std::time::Duration;

/// Connect using `REDIS_TEST_URL` (default localhost). `None` when Redis is
/// not reachable within two seconds.
pub async fn redis_manager() -> Option<SharedConnectionManager> {
    let redis_url =
        env::var("REDIS_TEST_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let pool = tokio::time::timeout(Duration::from_secs(2), RedisPool::connect(&redis_url))
        .await
        .ok()?
        .ok()?;

    pool.ping(Duration::from_secs(1)).await.ok()?;
    Some(pool.manager())
}
