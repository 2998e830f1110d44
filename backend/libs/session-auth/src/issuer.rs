//! Token issuer: mint an access/refresh pair and commit both to the ledger

use crate::claims::{Claims, Role, TokenClass};
use crate::codec::TokenCodec;
use crate::config::SessionConfig;
use crate::deadline::Deadline;
use crate::error::{Result, SessionError};
use crate::ledger::{ledger_key, ttl_until, SessionLedger};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    ledger: Arc<dyn SessionLedger>,
    config: SessionConfig,
}

struct Minted {
    key: String,
    token: String,
    expires_at: i64,
}

impl TokenIssuer {
    pub fn new(codec: Arc<TokenCodec>, ledger: Arc<dyn SessionLedger>, config: SessionConfig) -> Self {
        Self {
            codec,
            ledger,
            config,
        }
    }

    fn mint(&self, identity_id: Uuid, role: Role, class: TokenClass, now: i64) -> Result<Minted> {
        let ttl = match class {
            TokenClass::Access => self.config.access_ttl,
            TokenClass::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims::new(identity_id, role, class, now, now + ttl.as_secs() as i64);
        let token = self.codec.encode(&claims)?;

        Ok(Minted {
            key: ledger_key(identity_id, class),
            token,
            expires_at: claims.expires_at,
        })
    }

    /// Issue a fresh pair for `identity_id`, superseding whatever the ledger
    /// held for it.
    ///
    /// Both writes happen under `deadline`. When the access write lands but
    /// the refresh write does not, the access entry is removed again under a
    /// separate grace deadline, so a failed issue never leaves a pair that
    /// cannot be rotated.
    pub async fn issue_pair(
        &self,
        identity_id: Uuid,
        role: Role,
        deadline: &Deadline,
    ) -> Result<TokenPair> {
        deadline.ensure_open()?;

        let now = Utc::now().timestamp();
        let access = self.mint(identity_id, role, TokenClass::Access, now)?;
        let refresh = self.mint(identity_id, role, TokenClass::Refresh, now)?;

        if let Err(err) = deadline
            .run(self.ledger.put(&access.key, &access.token, ttl_until(access.expires_at, now)))
            .await
        {
            // A write cut off by the deadline may still have landed
            if err == SessionError::DeadlineExceeded {
                self.compensate(identity_id, &[&access]).await?;
            }
            return Err(err);
        }

        if let Err(err) = deadline
            .run(self.ledger.put(&refresh.key, &refresh.token, ttl_until(refresh.expires_at, now)))
            .await
        {
            warn!(
                identity_id = %identity_id,
                error = %err,
                "Refresh token write failed, rolling back access token"
            );
            self.compensate(identity_id, &[&access, &refresh]).await?;
            return Err(err);
        }

        info!(identity_id = %identity_id, role = %role, "Issued session token pair");

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_in: self.config.access_ttl.as_secs(),
        })
    }

    /// Remove entries this call wrote. Only our own values are removed, so a
    /// concurrent successful issue for the same identity is left intact.
    async fn compensate(&self, identity_id: Uuid, written: &[&Minted]) -> Result<()> {
        let grace = Deadline::after(self.config.cleanup_grace);

        for minted in written {
            if let Err(err) = grace
                .run(self.ledger.compare_and_delete(&minted.key, &minted.token))
                .await
            {
                error!(
                    identity_id = %identity_id,
                    key = %minted.key,
                    error = %err,
                    "Compensating cleanup failed, ledger may hold a dangling token"
                );
                return Err(SessionError::LedgerUnavailable(format!(
                    "cleanup of {} failed: {}",
                    minted.key, err
                )));
            }
        }

        Ok(())
    }
}
