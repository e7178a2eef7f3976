//! Authentication Module
//! Mission: Secure API access with JWT tokens, RBAC, and confirmed emails

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use api::AuthState;
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, require_manager};
pub use user_store::UserStore;
