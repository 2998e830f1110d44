//! Session ledger: the single live token per identity and token class
//!
//! Keys are `"<identity_id>:access"` and `"<identity_id>:refresh"`, values are
//! raw token strings, and the store TTL equals the token's remaining lifetime
//! at write time. Writes are last-write-wins; there is no cross-key
//! transaction.

use crate::claims::TokenClass;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod redis;

pub use self::memory::MemorySessionLedger;
#[cfg(any(test, feature = "test-util"))]
pub use self::memory::{Fault, LedgerOp};
pub use self::redis::RedisSessionLedger;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger backend error: {0}")]
    Backend(String),

    #[error("ledger operation timed out")]
    Timeout,
}

#[async_trait]
pub trait SessionLedger: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LedgerError>;

    /// Current live value, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), LedgerError>;

    /// Atomically remove `key` only if it currently holds `expected`.
    /// Returns whether anything was removed.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, LedgerError>;
}

pub fn ledger_key(identity_id: Uuid, class: TokenClass) -> String {
    format!("{}:{}", identity_id, class)
}

/// TTL for a token expiring at `expires_at`, never below one second.
pub fn ttl_until(expires_at: i64, now: i64) -> Duration {
    Duration::from_secs((expires_at - now).max(1) as u64)
}
