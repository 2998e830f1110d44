//! Session token lifecycle
//!
//! Issues, validates, rotates and revokes access/refresh token pairs backed by
//! a session ledger that holds exactly one live token per identity and class.
//!
//! - Tokens are HS256 JWTs; see [`claims`] for the wire format
//! - The ledger is an injected [`SessionLedger`] (Redis or in-memory)
//! - Validation requires a byte-exact ledger match and an active identity
//! - Rotation is destroy-then-create guarded by compare-and-delete
//! - Every ledger step runs under a caller-supplied [`Deadline`]

pub mod claims;
pub mod codec;
pub mod config;
pub mod deadline;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod ledger;
pub mod manager;
pub mod rotation;
pub mod secret_validation;
pub mod validator;

#[cfg(test)]
mod test_utils;

pub use claims::{Claims, Role, TokenClass, CLAIMS_VERSION};
pub use codec::TokenCodec;
pub use config::SessionConfig;
pub use deadline::Deadline;
pub use error::{Result, SessionError};
pub use identity::{
    DirectoryError, Identity, IdentityDirectory, IdentityStatus, MemoryIdentityDirectory,
};
pub use issuer::{TokenIssuer, TokenPair};
pub use ledger::{
    ledger_key, LedgerError, MemorySessionLedger, RedisSessionLedger, SessionLedger,
};
pub use manager::SessionManager;
pub use rotation::{RotationProtocol, RotationState};
pub use secret_validation::{validate_secret_strength, SecretStrength};
pub use validator::TokenValidator;
