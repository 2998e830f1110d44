// Auth Service Library
//
// Phone/password accounts on top of the `session-auth` token lifecycle.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod security;
pub mod validators;

pub use error::{AuthError, AuthResult};

use db::UserRepository;
use session_auth::{Deadline, SessionManager};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub users: Arc<dyn UserRepository>,
    /// Budget for the session and store calls of one request
    pub request_timeout: Duration,
}

impl AppState {
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}
