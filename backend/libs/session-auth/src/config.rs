use std::time::Duration;

const ACCESS_TOKEN_TTL_SECS: u64 = 3600; // 1 hour
const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600; // 7 days
const CLEANUP_GRACE_MS: u64 = 2000;

/// Token lifetimes and the grace window for compensating cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Budget for cleanup that must run even after the caller's deadline
    pub cleanup_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::from_secs(REFRESH_TOKEN_TTL_SECS),
            cleanup_grace: Duration::from_millis(CLEANUP_GRACE_MS),
        }
    }
}
