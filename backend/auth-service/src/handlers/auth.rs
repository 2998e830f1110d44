/// Authentication handlers
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use session_auth::IdentityStatus;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    error::{AuthError, AuthResult},
    models::user::{
        LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest, RegisterRequest,
        RegisterResponse, User,
    },
    security::password,
    AppState,
};

/// `POST /auth/register`
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> AuthResult<HttpResponse> {
    payload.validate()?;
    let payload = payload.into_inner();

    let password_hash = password::hash_password(&payload.password)?;
    let user = User::new(
        payload.phone_number,
        password_hash,
        payload.first_name,
        payload.last_name,
        payload.email,
    );

    let user = state.users.create_user(user).await?;
    info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "user registered".to_string(),
        user_id: user.id,
    }))
}

/// `POST /auth/login`
///
/// The password is checked before the account status so an unauthenticated
/// caller cannot tell deactivated accounts apart. Unknown phone numbers pay
/// for a hash verification too.
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> AuthResult<HttpResponse> {
    payload.validate()?;
    let deadline = state.deadline();

    let user = match deadline
        .bound(state.users.find_by_phone(&payload.phone_number))
        .await??
    {
        Some(user) => user,
        None => {
            password::verify_dummy_password(&payload.password)?;
            return Err(AuthError::InvalidCredentials);
        }
    };

    password::verify_password(&payload.password, &user.password_hash).map_err(|err| {
        warn!(user_id = %user.id, "Login failed: wrong password");
        err
    })?;

    match user.status {
        IdentityStatus::Active => {}
        IdentityStatus::Deactivated => {
            warn!(user_id = %user.id, "Login refused: account deactivated");
            return Err(AuthError::AccountDeactivated);
        }
        IdentityStatus::Deleted => {
            warn!(user_id = %user.id, "Login refused: account deleted");
            return Err(AuthError::InvalidCredentials);
        }
    }

    let pair = state.sessions.issue_pair(user.id, user.role, &deadline).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok().json(LoginResponse::from(pair)))
}

/// `POST /auth/logout`, behind the auth gate
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> AuthResult<HttpResponse> {
    state
        .sessions
        .logout(user.identity_id, &state.deadline())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "logged out".to_string(),
    }))
}

/// `POST /auth/refresh-token`
pub async fn refresh_token(
    state: web::Data<AppState>,
    payload: web::Json<RefreshTokenRequest>,
) -> AuthResult<HttpResponse> {
    payload.validate()?;

    let pair = state
        .sessions
        .rotate(&payload.refresh_token, &state.deadline())
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse::from(pair)))
}
