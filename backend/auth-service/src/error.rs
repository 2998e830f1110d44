use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use session_auth::SessionError;
use thiserror::Error;

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account deactivated")]
    AccountDeactivated,

    #[error("phone number already registered")]
    PhoneAlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthError::PhoneAlreadyExists => "CONFLICT",
            AuthError::UserNotFound => "NOT_FOUND",
            AuthError::Session(err) if err.is_authentication_failure() => "UNAUTHORIZED",
            AuthError::Session(err) if err.is_transient() => "SERVICE_UNAVAILABLE",
            AuthError::Session(_) | AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Session and internal details stay in the logs, not the response body.
    fn client_message(&self) -> String {
        match self {
            AuthError::Session(err) => err.client_message().to_string(),
            AuthError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountDeactivated => StatusCode::FORBIDDEN,
            AuthError::PhoneAlreadyExists => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Session(err) if err.is_authentication_failure() => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Session(err) if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Session(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if self.status_code() == StatusCode::UNAUTHORIZED {
            builder.insert_header(("WWW-Authenticate", "Bearer"));
        }
        builder.json(ErrorResponse {
            error: self.code(),
            message: self.client_message(),
        })
    }
}

// Convert validator errors to AuthError
impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AuthError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::AccountDeactivated, StatusCode::FORBIDDEN),
            (AuthError::PhoneAlreadyExists, StatusCode::CONFLICT),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::Session(SessionError::Revoked), StatusCode::UNAUTHORIZED),
            (
                AuthError::Session(SessionError::LedgerUnavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Session(SessionError::EncodingFailed("key".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AuthError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn test_session_details_are_not_exposed() {
        let err = AuthError::Session(SessionError::Malformed("missing role".into()));
        assert_eq!(err.client_message(), "invalid or expired session");

        let err = AuthError::Internal("argon2 exploded".into());
        assert_eq!(err.client_message(), "internal server error");
    }
}
