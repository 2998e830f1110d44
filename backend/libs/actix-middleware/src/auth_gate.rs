use crate::error::GateError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use session_auth::{Deadline, Role, SessionManager, TokenClass};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

/// Identity and role extracted from a validated access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub identity_id: Uuid,
    pub role: Role,
}

/// Access token authentication middleware
///
/// Requires `Authorization: Bearer <access_token>`. The token must decode,
/// be an access token, match the session ledger and belong to an active
/// identity. Rejected requests never reach the wrapped service.
#[derive(Clone)]
pub struct AuthGate {
    sessions: SessionManager,
    request_timeout: Duration,
}

impl AuthGate {
    pub fn new(sessions: SessionManager, request_timeout: Duration) -> Self {
        Self {
            sessions,
            request_timeout,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
            request_timeout: self.request_timeout,
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    sessions: SessionManager,
    request_timeout: Duration,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let sessions = self.sessions.clone();
        let deadline = Deadline::after(self.request_timeout);

        Box::pin(async move {
            let token = match bearer_token(&req) {
                Some(token) => token,
                None => {
                    tracing::warn!(path = %req.path(), "Missing or malformed Authorization header");
                    return Ok(req
                        .error_response(GateError::Unauthenticated)
                        .map_into_right_body());
                }
            };

            let claims = match sessions
                .authenticate(&token, TokenClass::Access, &deadline)
                .await
            {
                Ok(claims) => claims,
                Err(err) => {
                    if err.is_transient() {
                        tracing::error!(path = %req.path(), error = %err, "Session check unavailable");
                    } else {
                        tracing::warn!(path = %req.path(), error = %err, "Access token rejected");
                    }
                    return Ok(req
                        .error_response(GateError::from(&err))
                        .map_into_right_body());
                }
            };

            req.extensions_mut().insert(AuthenticatedUser {
                identity_id: claims.identity_id,
                role: claims.role,
            });

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(*user)),
            None => ready(Err(GateError::Unauthenticated.into())),
        }
    }
}
