/// Administrative user management, mounted behind `RequireRole(Admin)`
use actix_middleware::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    models::{UpdateStatusRequest, UserProfileResponse},
    AppState,
};

/// `GET /admin/users/{id}`
pub async fn get_user(state: web::Data<AppState>, path: web::Path<Uuid>) -> AuthResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(path.into_inner())
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(UserProfileResponse::from(user)))
}

/// `PATCH /admin/users/{id}/status`
///
/// Tokens of a user that is no longer active already fail validation; the
/// ledger entries are dropped as well so they stop occupying the store.
pub async fn update_user_status(
    state: web::Data<AppState>,
    admin: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateStatusRequest>,
) -> AuthResult<HttpResponse> {
    let user_id = path.into_inner();
    let status = payload.into_inner().status;

    let user = state
        .users
        .update_status(user_id, status)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    info!(
        admin_id = %admin.identity_id,
        user_id = %user_id,
        status = ?status,
        "User status changed"
    );

    if !status.is_active() {
        if let Err(err) = state.sessions.logout(user_id, &state.deadline()).await {
            warn!(user_id = %user_id, error = %err, "Failed to drop sessions of inactive user");
        }
    }

    Ok(HttpResponse::Ok().json(UserProfileResponse::from(user)))
}
