/// HTTP request handlers (REST API)
pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

// Re-export handlers for easy access
pub use admin::{get_user, update_user_status};
pub use auth::{login, logout, refresh_token, register};
pub use health::health_check;
pub use users::{change_password, delete_me, me, update_me};
