//! Minimum-role check for routes behind [`AuthGate`](crate::AuthGate)
//!
//! Must run after the gate. Actix applies `wrap` calls inside-out, so
//! register it first:
//!
//! ```rust,ignore
//! web::scope("/admin")
//!     .wrap(RequireRole::new(Role::Admin))
//!     .wrap(AuthGate::new(sessions, timeout))
//! ```

use crate::auth_gate::AuthenticatedUser;
use crate::error::GateError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use session_auth::Role;

#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    min: Role,
}

impl RequireRole {
    pub fn new(min: Role) -> Self {
        Self { min }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            min: self.min,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    min: Role,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied();

        let rejection = match user {
            None => Some(GateError::Unauthenticated),
            Some(user) if !user.role.satisfies(self.min) => {
                tracing::warn!(
                    identity_id = %user.identity_id,
                    role = %user.role,
                    required = %self.min,
                    path = %req.path(),
                    "Insufficient role"
                );
                Some(GateError::Forbidden)
            }
            Some(_) => None,
        };

        if let Some(err) = rejection {
            let res = req.error_response(err).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}
