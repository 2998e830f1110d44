/// Route definitions and middleware setup
use actix_middleware::{AuthGate, RequireRole};
use actix_web::web;
use session_auth::Role;

use crate::{error::AuthError, handlers, AppState};

/// Mount every endpoint. Protected scopes carry their own `AuthGate`;
/// `RequireRole` is registered first so it runs after the gate.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let gate = AuthGate::new(state.sessions.clone(), state.request_timeout);

    // Malformed JSON bodies get the same error shape as failed validation
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AuthError::Validation(err.to_string()).into()),
    );

    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(handlers::register))
                .route("/login", web::post().to(handlers::login))
                .route("/refresh-token", web::post().to(handlers::refresh_token))
                .service(
                    web::resource("/logout")
                        .wrap(gate.clone())
                        .route(web::post().to(handlers::logout)),
                ),
        )
        .service(
            web::scope("/users")
                .wrap(gate.clone())
                .service(
                    web::resource("/me")
                        .route(web::get().to(handlers::me))
                        .route(web::put().to(handlers::update_me))
                        .route(web::delete().to(handlers::delete_me)),
                )
                .route(
                    "/me/change-password",
                    web::put().to(handlers::change_password),
                ),
        )
        .service(
            web::scope("/admin")
                .wrap(RequireRole::new(Role::Admin))
                .wrap(gate)
                .route("/users/{id}", web::get().to(handlers::get_user))
                .route(
                    "/users/{id}/status",
                    web::patch().to(handlers::update_user_status),
                ),
        );
}
