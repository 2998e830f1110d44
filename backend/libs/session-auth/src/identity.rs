//! Identity lookups consumed at validation time
//!
//! The directory is owned elsewhere (the user store); this crate only reads
//! an identity's role and lifecycle status.

use crate::claims::Role;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityStatus {
    Active,
    Deactivated,
    Deleted,
}

impl IdentityStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, IdentityStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    pub status: IdentityStatus,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("identity directory unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// `None` when the identity is unknown.
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError>;
}

/// Directory kept in process memory
#[derive(Debug, Default)]
pub struct MemoryIdentityDirectory {
    identities: DashMap<Uuid, Identity>,
    #[cfg(any(test, feature = "test-util"))]
    offline: AtomicBool,
}

impl MemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, identity: Identity) {
        self.identities.insert(identity.id, identity);
    }

    /// Returns false when the identity is unknown.
    pub fn set_status(&self, id: Uuid, status: IdentityStatus) -> bool {
        match self.identities.get_mut(&id) {
            Some(mut identity) => {
                identity.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) {
        self.identities.remove(&id);
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityDirectory for MemoryIdentityDirectory {
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, DirectoryError> {
        #[cfg(any(test, feature = "test-util"))]
        if self.offline.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unreachable("directory offline".into()));
        }
        Ok(self.identities.get(&id).map(|i| i.value().clone()))
    }
}
