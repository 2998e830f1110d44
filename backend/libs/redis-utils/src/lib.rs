use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionInfo, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Redis connection pool backed by a single reconnecting connection manager.
pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info: ConnectionInfo = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;

        let client = Client::open(info).context("failed to construct Redis client")?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connection manager initialized");

        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }

    /// Round-trip a PING, bounded by `limit`.
    pub async fn ping(&self, limit: Duration) -> Result<(), RedisError> {
        let manager = self.manager.clone();
        with_timeout(limit, async move {
            let mut conn = manager.lock().await;
            redis::cmd("PING").query_async::<_, String>(&mut *conn).await?;
            Ok(())
        })
        .await
    }
}

/// Bound a Redis round trip. An elapsed timer surfaces as an `IoError` of
/// kind `TimedOut`, so `RedisError::is_timeout` tells it apart from other
/// connection failures.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, RedisError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "Redis command timed out");
            Err(RedisError::from(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "redis command timed out",
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_through_result() {
        let value = with_timeout(Duration::from_millis(50), async { Ok::<_, RedisError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses_as_timeout() {
        let result = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, RedisError>(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), redis::ErrorKind::IoError);
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_command_failure_is_not_a_timeout() {
        let result = with_timeout(Duration::from_millis(50), async {
            Err::<(), _>(RedisError::from((redis::ErrorKind::IoError, "connection refused")))
        })
        .await;

        assert!(!result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = RedisPool::connect("not a redis url").await;
        assert!(result.is_err());
    }
}
