//! Session error taxonomy
//!
//! Cryptographic and structural failures are authentication rejections and are
//! never retried. Store and directory outages are transient and must not be
//! reported to clients as "this credential is invalid".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Wrong token class: expected {expected}, got {actual}")]
    WrongClass {
        expected: crate::TokenClass,
        actual: crate::TokenClass,
    },

    #[error("Token revoked")]
    Revoked,

    #[error("Identity unavailable")]
    IdentityUnavailable,

    #[error("Session ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Identity directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),
}

impl SessionError {
    /// The credential itself was rejected (HTTP 401 territory)
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::Malformed(_)
                | Self::InvalidSignature
                | Self::Expired
                | Self::WrongClass { .. }
                | Self::Revoked
                | Self::IdentityUnavailable
        )
    }

    /// A dependency failed; the credential may well be valid
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::LedgerUnavailable(_) | Self::DirectoryUnavailable(_) | Self::DeadlineExceeded
        )
    }

    /// Client-safe message. Authentication failures collapse to one string so the
    /// response never reveals which check failed.
    pub fn client_message(&self) -> &'static str {
        if self.is_authentication_failure() {
            "invalid or expired session"
        } else if self.is_transient() {
            "session service temporarily unavailable"
        } else {
            "internal server error"
        }
    }
}

impl From<crate::ledger::LedgerError> for SessionError {
    fn from(err: crate::ledger::LedgerError) -> Self {
        SessionError::LedgerUnavailable(err.to_string())
    }
}

impl From<crate::identity::DirectoryError> for SessionError {
    fn from(err: crate::identity::DirectoryError) -> Self {
        SessionError::DirectoryUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenClass;

    #[test]
    fn test_authentication_failures_share_client_message() {
        let errors = [
            SessionError::Malformed("missing role".into()),
            SessionError::InvalidSignature,
            SessionError::Expired,
            SessionError::WrongClass {
                expected: TokenClass::Access,
                actual: TokenClass::Refresh,
            },
            SessionError::Revoked,
            SessionError::IdentityUnavailable,
        ];

        for err in errors {
            assert!(err.is_authentication_failure(), "{err:?}");
            assert!(!err.is_transient(), "{err:?}");
            assert_eq!(err.client_message(), "invalid or expired session");
        }
    }

    #[test]
    fn test_outages_are_transient_not_rejections() {
        let errors = [
            SessionError::LedgerUnavailable("connection refused".into()),
            SessionError::DirectoryUnavailable("timeout".into()),
            SessionError::DeadlineExceeded,
        ];

        for err in errors {
            assert!(err.is_transient(), "{err:?}");
            assert!(!err.is_authentication_failure(), "{err:?}");
        }
    }

    #[test]
    fn test_encoding_failure_is_internal() {
        let err = SessionError::EncodingFailed("bad key".into());
        assert!(!err.is_transient());
        assert!(!err.is_authentication_failure());
        assert_eq!(err.client_message(), "internal server error");
    }
}
