//! Token validator: signature, class, exact ledger match, identity status

use crate::claims::{Claims, TokenClass};
use crate::codec::TokenCodec;
use crate::deadline::Deadline;
use crate::error::{Result, SessionError};
use crate::identity::{Identity, IdentityDirectory};
use crate::ledger::{ledger_key, SessionLedger};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct TokenValidator {
    codec: Arc<TokenCodec>,
    ledger: Arc<dyn SessionLedger>,
    directory: Arc<dyn IdentityDirectory>,
}

impl TokenValidator {
    pub fn new(
        codec: Arc<TokenCodec>,
        ledger: Arc<dyn SessionLedger>,
        directory: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self {
            codec,
            ledger,
            directory,
        }
    }

    /// Validate `token` as the current `expected` token of `identity_id`.
    ///
    /// The presented token must be byte-identical to the ledger entry; a
    /// missing entry (logged out, rotated, expired) and a different entry
    /// both yield [`SessionError::Revoked`].
    pub async fn validate(
        &self,
        identity_id: Uuid,
        token: &str,
        expected: TokenClass,
        deadline: &Deadline,
    ) -> Result<Claims> {
        deadline.ensure_open()?;
        let claims = self.codec.decode(token)?;
        let (claims, _) = self
            .verify(identity_id, token, claims, expected, deadline)
            .await?;
        Ok(claims)
    }

    /// Validate a token on its own, bound to whichever identity its claims name.
    pub async fn authenticate(
        &self,
        token: &str,
        expected: TokenClass,
        deadline: &Deadline,
    ) -> Result<Claims> {
        let (claims, _) = self
            .authenticate_with_identity(token, expected, deadline)
            .await?;
        Ok(claims)
    }

    /// Like [`authenticate`](Self::authenticate), also returning the
    /// directory's current view of the identity.
    pub async fn authenticate_with_identity(
        &self,
        token: &str,
        expected: TokenClass,
        deadline: &Deadline,
    ) -> Result<(Claims, Identity)> {
        deadline.ensure_open()?;
        let claims = self.codec.decode(token)?;
        self.verify(claims.identity_id, token, claims, expected, deadline)
            .await
    }

    async fn verify(
        &self,
        identity_id: Uuid,
        token: &str,
        claims: Claims,
        expected: TokenClass,
        deadline: &Deadline,
    ) -> Result<(Claims, Identity)> {
        self.check_claims(identity_id, &claims, expected)?;

        let key = ledger_key(identity_id, expected);
        let stored = deadline.run(self.ledger.get(&key)).await?;
        if stored.as_deref() != Some(token) {
            warn!(
                identity_id = %identity_id,
                token_class = %expected,
                live_entry = stored.is_some(),
                "Presented token does not match session ledger"
            );
            return Err(SessionError::Revoked);
        }

        let identity = deadline
            .run(self.directory.find_identity(identity_id))
            .await?;
        match identity {
            Some(identity) if identity.status.is_active() => Ok((claims, identity)),
            Some(identity) => {
                warn!(identity_id = %identity_id, status = ?identity.status, "Identity not active");
                Err(SessionError::IdentityUnavailable)
            }
            None => {
                warn!(identity_id = %identity_id, "Identity not found");
                Err(SessionError::IdentityUnavailable)
            }
        }
    }

    fn check_claims(&self, identity_id: Uuid, claims: &Claims, expected: TokenClass) -> Result<()> {
        if claims.token_class != expected {
            warn!(
                identity_id = %claims.identity_id,
                expected = %expected,
                actual = %claims.token_class,
                "Token class mismatch"
            );
            return Err(SessionError::WrongClass {
                expected,
                actual: claims.token_class,
            });
        }

        if claims.identity_id != identity_id {
            warn!(
                identity_id = %identity_id,
                token_identity = %claims.identity_id,
                "Token belongs to a different identity"
            );
            return Err(SessionError::Revoked);
        }

        Ok(())
    }
}
