//! In-process ledger with deterministic TTL behaviour
//!
//! Expiry is measured on the tokio clock, so tests running with a paused
//! clock can advance time explicitly. Expired entries are evicted lazily on
//! access; there is no background sweep.
//!
//! With the `test-util` feature, faults can be injected per operation and
//! key suffix to exercise partial failure paths.

use super::{LedgerError, SessionLedger};
use async_trait::async_trait;
use dashmap::DashMap;
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    Put,
    Get,
    Delete,
    CompareAndDelete,
}

#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with a backend error
    Fail,
    /// Stall before completing normally
    Delay(Duration),
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionLedger {
    entries: DashMap<String, Entry>,
    #[cfg(any(test, feature = "test-util"))]
    faults: DashMap<(LedgerOp, String), Fault>,
    #[cfg(any(test, feature = "test-util"))]
    offline: AtomicBool,
}

impl MemorySessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(not(any(test, feature = "test-util")))]
    async fn check_fault(&self, _op: LedgerOp, _key: &str) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-util"))]
impl MemorySessionLedger {
    /// Apply `fault` to every `op` whose key ends with `key_suffix`
    /// (an empty suffix matches all keys).
    pub fn inject(&self, op: LedgerOp, key_suffix: &str, fault: Fault) {
        self.faults.insert((op, key_suffix.to_string()), fault);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Simulate an unreachable store: every operation fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn check_fault(&self, op: LedgerOp, key: &str) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Backend("connection refused".into()));
        }

        let fault = self
            .faults
            .iter()
            .find(|f| f.key().0 == op && key.ends_with(f.key().1.as_str()))
            .map(|f| *f.value());

        match fault {
            Some(Fault::Fail) => Err(LedgerError::Backend(format!(
                "injected {:?} failure for {}",
                op, key
            ))),
            Some(Fault::Delay(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SessionLedger for MemorySessionLedger {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LedgerError> {
        self.check_fault(LedgerOp::Put, key).await?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        self.check_fault(LedgerOp::Get, key).await?;
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), LedgerError> {
        self.check_fault(LedgerOp::Delete, key).await?;
        self.entries.remove(key);
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, LedgerError> {
        self.check_fault(LedgerOp::CompareAndDelete, key).await?;
        let now = Instant::now();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.is_live(now) && entry.value == expected);
        Ok(removed.is_some())
    }
}
