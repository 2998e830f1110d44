/// Self-service endpoints for the authenticated caller, behind the auth gate
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use session_auth::IdentityStatus;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    error::{AuthError, AuthResult},
    models::{ChangePasswordRequest, MessageResponse, UpdateProfileRequest, UserProfileResponse},
    security::password,
    AppState,
};

/// `GET /users/me`
pub async fn me(state: web::Data<AppState>, user: AuthenticatedUser) -> AuthResult<HttpResponse> {
    let profile = state
        .users
        .find_by_id(user.identity_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(UserProfileResponse::from(profile)))
}

/// `PUT /users/me`
pub async fn update_me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: web::Json<UpdateProfileRequest>,
) -> AuthResult<HttpResponse> {
    payload.validate()?;

    let profile = state
        .users
        .update_profile(user.identity_id, payload.into_inner())
        .await?
        .ok_or(AuthError::UserNotFound)?;
    info!(user_id = %user.identity_id, "Profile updated");

    Ok(HttpResponse::Ok().json(UserProfileResponse::from(profile)))
}

/// `PUT /users/me/change-password`
///
/// Existing sessions stay valid; the caller logs out explicitly to end them.
pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: web::Json<ChangePasswordRequest>,
) -> AuthResult<HttpResponse> {
    payload.validate()?;
    let payload = payload.into_inner();

    let account = state
        .users
        .find_by_id(user.identity_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    match account.status {
        IdentityStatus::Active => {}
        IdentityStatus::Deactivated => return Err(AuthError::AccountDeactivated),
        IdentityStatus::Deleted => return Err(AuthError::InvalidCredentials),
    }

    password::verify_password(&payload.old_password, &account.password_hash).map_err(|err| {
        warn!(user_id = %account.id, "Password change refused: wrong old password");
        err
    })?;

    let password_hash = password::hash_password(&payload.new_password)?;
    state
        .users
        .update_password(account.id, password_hash)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    info!(user_id = %account.id, "Password changed");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "password changed".to_string(),
    }))
}

/// `DELETE /users/me`
///
/// Soft delete: the account is marked deleted, which fails every token it
/// still holds, and its ledger entries are dropped.
pub async fn delete_me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> AuthResult<HttpResponse> {
    state
        .users
        .update_status(user.identity_id, IdentityStatus::Deleted)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    info!(user_id = %user.identity_id, "Account deleted");

    if let Err(err) = state.sessions.logout(user.identity_id, &state.deadline()).await {
        warn!(user_id = %user.identity_id, error = %err, "Failed to drop sessions of deleted user");
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "account deleted".to_string(),
    }))
}
