//! Credential encoder/decoder (HS256 over a shared secret)

use crate::claims::{Claims, CLAIMS_VERSION};
use crate::error::{Result, SessionError};
use crate::secret_validation::{validate_secret_strength, SecretStrength};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, warn};

const DEFAULT_VALIDATION_LEEWAY: u64 = 30; // 30 seconds clock skew tolerance

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from the process-wide signing secret.
    ///
    /// Weak secrets are refused outright; see [`validate_secret_strength`].
    pub fn new(secret: &str) -> Result<Self> {
        match validate_secret_strength(secret) {
            SecretStrength::Weak => {
                return Err(SessionError::InvalidSecret(
                    "secret must be at least 32 bytes of high-entropy data".into(),
                ))
            }
            SecretStrength::Acceptable => {
                warn!("JWT secret is acceptable but shorter than recommended (64 bytes)")
            }
            SecretStrength::Strong => {}
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = DEFAULT_VALIDATION_LEEWAY;
        validation.set_required_spec_claims(&["exp", "iat"]);

        info!("Token codec initialized with HS256");

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign `claims`. Identical claims always produce an identical token.
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| SessionError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature and expiry, then decode the claims.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    SessionError::InvalidSignature
                }
                _ => SessionError::Malformed(e.to_string()),
            }
        })?;

        if data.claims.ver != CLAIMS_VERSION {
            return Err(SessionError::Malformed(format!(
                "unsupported claims version {}",
                data.claims.ver
            )));
        }

        Ok(data.claims)
    }
}
