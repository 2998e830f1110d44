//! Redis-backed session ledger

use super::{LedgerError, SessionLedger};
use ::redis::{RedisError, Script};
use async_trait::async_trait;
use redis_utils::{with_timeout, SharedConnectionManager};
use std::time::Duration;
use tracing::error;

/// Delete KEYS[1] only while it still holds ARGV[1].
const COMPARE_AND_DELETE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
"#;

pub struct RedisSessionLedger {
    redis: SharedConnectionManager,
    response_timeout: Duration,
    compare_and_delete: Script,
}

impl RedisSessionLedger {
    pub fn new(redis: SharedConnectionManager, response_timeout: Duration) -> Self {
        Self {
            redis,
            response_timeout,
            compare_and_delete: Script::new(COMPARE_AND_DELETE_SCRIPT),
        }
    }
}

fn ledger_error(op: &str, key: &str, err: RedisError) -> LedgerError {
    error!(operation = op, key = %key, error = %err, "Session ledger command failed");
    if err.is_timeout() {
        LedgerError::Timeout
    } else {
        LedgerError::Backend(err.to_string())
    }
}

#[async_trait]
impl SessionLedger for RedisSessionLedger {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), LedgerError> {
        let ttl_secs = ttl.as_secs().max(1);
        with_timeout(self.response_timeout, async {
            let mut conn = self.redis.lock().await;
            ::redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl_secs)
                .query_async::<_, ()>(&mut *conn)
                .await
        })
        .await
        .map_err(|e| ledger_error("put", key, e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        with_timeout(self.response_timeout, async {
            let mut conn = self.redis.lock().await;
            ::redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<String>>(&mut *conn)
                .await
        })
        .await
        .map_err(|e| ledger_error("get", key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), LedgerError> {
        with_timeout(self.response_timeout, async {
            let mut conn = self.redis.lock().await;
            ::redis::cmd("DEL")
                .arg(key)
                .query_async::<_, i64>(&mut *conn)
                .await
                .map(|_| ())
        })
        .await
        .map_err(|e| ledger_error("delete", key, e))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, LedgerError> {
        let removed: i64 = with_timeout(self.response_timeout, async {
            let mut conn = self.redis.lock().await;
            self.compare_and_delete
                .key(key)
                .arg(expected)
                .invoke_async(&mut *conn)
                .await
        })
        .await
        .map_err(|e| ledger_error("compare_and_delete", key, e))?;

        Ok(removed > 0)
    }
}
