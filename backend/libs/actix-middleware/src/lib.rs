//! # Actix Middleware Library
//!
//! Request pipeline stages for the auth service
//!
//! ## Modules
//! - `auth_gate`: access token authentication, attaches [`AuthenticatedUser`]
//! - `require_role`: minimum-role authorization for gated routes
//! - `correlation_id`: request correlation IDs
//! - `logging`: request/response logging

pub mod auth_gate;
pub mod correlation_id;
pub mod error;
pub mod logging;
pub mod require_role;

pub use auth_gate::{AuthGate, AuthenticatedUser};
pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use error::GateError;
pub use logging::Logging;
pub use require_role::RequireRole;
