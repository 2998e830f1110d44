//! Rejections produced by the authorization middlewares

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use session_auth::SessionError;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// Missing, invalid, expired or revoked credential
    #[error("invalid or expired session")]
    Unauthenticated,

    /// Authenticated but below the route's required role
    #[error("insufficient privileges")]
    Forbidden,

    #[error("session service temporarily unavailable")]
    Unavailable,

    #[error("internal server error")]
    Internal,
}

impl GateError {
    pub fn code(&self) -> &'static str {
        match self {
            GateError::Unauthenticated => "UNAUTHORIZED",
            GateError::Forbidden => "FORBIDDEN",
            GateError::Unavailable => "SERVICE_UNAVAILABLE",
            GateError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl From<&SessionError> for GateError {
    fn from(err: &SessionError) -> Self {
        if err.is_authentication_failure() {
            GateError::Unauthenticated
        } else if err.is_transient() {
            GateError::Unavailable
        } else {
            GateError::Internal
        }
    }
}

impl ResponseError for GateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GateError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GateError::Forbidden => StatusCode::FORBIDDEN,
            GateError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            GateError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if *self == GateError::Unauthenticated {
            builder.insert_header(("WWW-Authenticate", "Bearer"));
        }
        builder.json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_auth::TokenClass;

    #[test]
    fn test_session_errors_map_to_status() {
        let cases = [
            (SessionError::Revoked, StatusCode::UNAUTHORIZED),
            (SessionError::Expired, StatusCode::UNAUTHORIZED),
            (
                SessionError::WrongClass {
                    expected: TokenClass::Access,
                    actual: TokenClass::Refresh,
                },
                StatusCode::UNAUTHORIZED,
            ),
            (SessionError::IdentityUnavailable, StatusCode::UNAUTHORIZED),
            (
                SessionError::LedgerUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (SessionError::DeadlineExceeded, StatusCode::SERVICE_UNAVAILABLE),
            (
                SessionError::EncodingFailed("key".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(GateError::from(&err).status_code(), status, "{err:?}");
        }
    }
}
