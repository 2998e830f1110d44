//! Session lifecycle entry points used by the HTTP layer

use crate::claims::{Claims, Role, TokenClass};
use crate::codec::TokenCodec;
use crate::config::SessionConfig;
use crate::deadline::Deadline;
use crate::error::Result;
use crate::identity::IdentityDirectory;
use crate::issuer::{TokenIssuer, TokenPair};
use crate::ledger::{ledger_key, SessionLedger};
use crate::rotation::RotationProtocol;
use crate::validator::TokenValidator;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Issue, validate, rotate and revoke session token pairs
#[derive(Clone)]
pub struct SessionManager {
    issuer: TokenIssuer,
    validator: TokenValidator,
    rotation: RotationProtocol,
    ledger: Arc<dyn SessionLedger>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        codec: Arc<TokenCodec>,
        ledger: Arc<dyn SessionLedger>,
        directory: Arc<dyn IdentityDirectory>,
        config: SessionConfig,
    ) -> Self {
        let issuer = TokenIssuer::new(codec.clone(), ledger.clone(), config);
        let validator = TokenValidator::new(codec, ledger.clone(), directory);
        let rotation = RotationProtocol::new(
            validator.clone(),
            issuer.clone(),
            ledger.clone(),
            config.cleanup_grace,
        );

        Self {
            issuer,
            validator,
            rotation,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn issue_pair(
        &self,
        identity_id: Uuid,
        role: Role,
        deadline: &Deadline,
    ) -> Result<TokenPair> {
        self.issuer.issue_pair(identity_id, role, deadline).await
    }

    pub async fn validate(
        &self,
        identity_id: Uuid,
        token: &str,
        expected: TokenClass,
        deadline: &Deadline,
    ) -> Result<Claims> {
        self.validator
            .validate(identity_id, token, expected, deadline)
            .await
    }

    pub async fn authenticate(
        &self,
        token: &str,
        expected: TokenClass,
        deadline: &Deadline,
    ) -> Result<Claims> {
        self.validator.authenticate(token, expected, deadline).await
    }

    pub async fn rotate(&self, refresh_token: &str, deadline: &Deadline) -> Result<TokenPair> {
        self.rotation.rotate(refresh_token, deadline).await
    }

    /// Remove both ledger entries for `identity_id`.
    ///
    /// Both deletes are attempted; the first failure is returned.
    pub async fn logout(&self, identity_id: Uuid, deadline: &Deadline) -> Result<()> {
        let access = deadline
            .run(self.ledger.delete(&ledger_key(identity_id, TokenClass::Access)))
            .await;
        let refresh = deadline
            .run(self.ledger.delete(&ledger_key(identity_id, TokenClass::Refresh)))
            .await;

        access.and(refresh)?;
        info!(identity_id = %identity_id, "Session logged out");
        Ok(())
    }
}
