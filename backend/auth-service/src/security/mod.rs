/// Security module for authentication
/// Password hashing lives here; session tokens come from `session-auth`
pub mod password;

pub use password::{hash_password, init_dummy_hash, verify_dummy_password, verify_password};
