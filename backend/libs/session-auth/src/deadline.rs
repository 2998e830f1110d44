//! Caller-supplied deadline threaded through every ledger and signing step

use crate::error::{Result, SessionError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(duration: Duration) -> Self {
        Self::at(Instant::now() + duration)
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    pub fn has_elapsed(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Fail fast before starting the next step.
    pub fn ensure_open(&self) -> Result<()> {
        if self.has_elapsed() {
            Err(SessionError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Run one step: refuse to start it once the deadline has passed, and
    /// abandon it if the deadline passes while it is in flight.
    pub async fn run<T, E, F>(&self, step: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<SessionError>,
    {
        self.ensure_open()?;
        match timeout_at(self.at, step).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(SessionError::DeadlineExceeded),
        }
    }

    /// Bound a step that reports its own error type; only the deadline
    /// itself maps to [`SessionError`].
    pub async fn bound<T, F>(&self, step: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        self.ensure_open()?;
        timeout_at(self.at, step)
            .await
            .map_err(|_| SessionError::DeadlineExceeded)
    }
}
