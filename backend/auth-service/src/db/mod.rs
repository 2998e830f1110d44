/// User store
pub mod user_repo;

pub use user_repo::{MemoryUserRepository, UserRepository};
