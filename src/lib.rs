//! LogiTrack Backend Library
//!
//! Warehouse and logistics tracking API: inventory, orders, JWT
//! authentication with role-based write access, and a TTL cache on the
//! inventory read path.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod middleware;
pub mod models;
pub mod seed;
pub mod store;

pub use api::routes::create_router;
pub use auth::{JwtHandler, UserStore};
pub use cache::SnapshotCache;
pub use config::Config;
pub use store::Db;
