//! Refresh token rotation
//!
//! ```text
//! Presented -> Validated -> Superseded -> Reissued -> Rotated
//!     \            \             \
//!      +------------+-------------+--> Rejected
//! ```
//!
//! The refresh entry is removed with compare-and-delete, so when the same
//! refresh token is rotated concurrently exactly one caller gets past
//! `Superseded`; the others are rejected as revoked and write nothing.
//!
//! The new pair carries the role the identity directory holds now, not the
//! one baked into the presented refresh token.

use crate::claims::TokenClass;
use crate::deadline::Deadline;
use crate::error::{Result, SessionError};
use crate::issuer::{TokenIssuer, TokenPair};
use crate::ledger::{ledger_key, SessionLedger};
use crate::validator::TokenValidator;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Presented,
    Validated,
    Superseded,
    Reissued,
    Rotated,
    Rejected,
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotationState::Presented => "presented",
            RotationState::Validated => "validated",
            RotationState::Superseded => "superseded",
            RotationState::Reissued => "reissued",
            RotationState::Rotated => "rotated",
            RotationState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

fn transition(identity_id: Option<Uuid>, state: RotationState) {
    match identity_id {
        Some(id) => debug!(identity_id = %id, state = %state, "Rotation state"),
        None => debug!(state = %state, "Rotation state"),
    }
}

#[derive(Clone)]
pub struct RotationProtocol {
    validator: TokenValidator,
    issuer: TokenIssuer,
    ledger: Arc<dyn SessionLedger>,
    cleanup_grace: Duration,
}

impl RotationProtocol {
    pub fn new(
        validator: TokenValidator,
        issuer: TokenIssuer,
        ledger: Arc<dyn SessionLedger>,
        cleanup_grace: Duration,
    ) -> Self {
        Self {
            validator,
            issuer,
            ledger,
            cleanup_grace,
        }
    }

    /// Exchange a live refresh token for a brand-new pair.
    ///
    /// Once `Superseded` is reached the old pair is gone even if reissue then
    /// fails; the caller has to log in again.
    pub async fn rotate(&self, refresh_token: &str, deadline: &Deadline) -> Result<TokenPair> {
        transition(None, RotationState::Presented);

        let (claims, identity) = match self
            .validator
            .authenticate_with_identity(refresh_token, TokenClass::Refresh, deadline)
            .await
        {
            Ok(verified) => verified,
            Err(err) => {
                transition(None, RotationState::Rejected);
                return Err(err);
            }
        };
        let identity_id = claims.identity_id;
        transition(Some(identity_id), RotationState::Validated);

        if let Err(err) = self.supersede(identity_id, refresh_token, deadline).await {
            transition(Some(identity_id), RotationState::Rejected);
            return Err(err);
        }
        transition(Some(identity_id), RotationState::Superseded);

        if identity.role != claims.role {
            info!(
                identity_id = %identity_id,
                token_role = %claims.role,
                role = %identity.role,
                "Role changed since last issue"
            );
        }

        let pair = match self.issuer.issue_pair(identity_id, identity.role, deadline).await {
            Ok(pair) => pair,
            Err(err) => {
                warn!(
                    identity_id = %identity_id,
                    error = %err,
                    "Reissue failed after old pair was superseded"
                );
                transition(Some(identity_id), RotationState::Rejected);
                return Err(err);
            }
        };
        transition(Some(identity_id), RotationState::Reissued);

        info!(identity_id = %identity_id, "Refresh token rotated");
        transition(Some(identity_id), RotationState::Rotated);
        Ok(pair)
    }

    /// Remove the presented refresh entry, then the access entry.
    ///
    /// Once the refresh entry is gone the access entry must follow: a failed
    /// access delete is retried under the cleanup grace deadline, and only if
    /// that also fails is the identity left with a dangling access token.
    async fn supersede(&self, identity_id: Uuid, refresh_token: &str, deadline: &Deadline) -> Result<()> {
        let refresh_key = ledger_key(identity_id, TokenClass::Refresh);
        let removed = deadline
            .run(self.ledger.compare_and_delete(&refresh_key, refresh_token))
            .await?;
        if !removed {
            warn!(identity_id = %identity_id, "Refresh token already superseded by a concurrent request");
            return Err(SessionError::Revoked);
        }

        let access_key = ledger_key(identity_id, TokenClass::Access);
        let err = match deadline.run(self.ledger.delete(&access_key)).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        warn!(
            identity_id = %identity_id,
            error = %err,
            "Access token delete failed after refresh was superseded, retrying"
        );

        let grace = Deadline::after(self.cleanup_grace);
        if let Err(cleanup) = grace.run(self.ledger.delete(&access_key)).await {
            error!(
                identity_id = %identity_id,
                key = %access_key,
                error = %cleanup,
                "Compensating cleanup failed, ledger may hold a dangling access token"
            );
            return Err(SessionError::LedgerUnavailable(format!(
                "cleanup of {} failed: {}",
                access_key, cleanup
            )));
        }

        Err(err)
    }
}
