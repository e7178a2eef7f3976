//! Service Configuration
//! Mission: Load all runtime settings from the environment, fail fast on gaps

use anyhow::{bail, Result};
use std::env;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Symmetric JWT signing secret. Required; startup aborts without it.
    pub jwt_secret: String,
    /// Token issuer. Also used as the audience, mirroring single-tenant setups.
    pub jwt_issuer: String,
    pub db_path: String,
    pub bind_addr: String,
    pub admin_email: String,
    pub admin_password: String,
    pub seed_demo_data: bool,
}

impl Config {
    /// Read configuration from environment variables.
    ///
    /// `JWT_SECRET` is the only mandatory variable: the signing key must
    /// never live in source, and an empty secret would silently accept
    /// forged tokens.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => bail!("JWT_SECRET must be set to a non-empty signing secret"),
        };

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "logitrack".to_string());
        let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "logitrack.db".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@logitrack.com".to_string());
        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "AdminPass123!".to_string());

        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        Ok(Self {
            jwt_secret,
            jwt_issuer,
            db_path,
            bind_addr,
            admin_email,
            admin_password,
            seed_demo_data,
        })
    }
}
