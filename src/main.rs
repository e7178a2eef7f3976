//! LogiTrack - Warehouse & Logistics Tracking API
//! Mission: Track inventory and orders behind JWT auth with role-based writes

use anyhow::{Context, Result};
use dotenv::dotenv;
use logitrack_backend::{
    auth::{JwtHandler, UserStore},
    config::Config,
    create_router, seed,
    store::Db,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    dotenv().ok();
    init_tracing();

    // Missing JWT secret is a fatal startup condition
    let config = Config::from_env()?;

    info!("🚀 LogiTrack API starting");

    let db = Arc::new(Db::new(&config.db_path)?);
    let user_store = Arc::new(UserStore::new(&config.db_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.jwt_issuer.clone(),
    ));

    info!("📊 Database initialized at: {}", config.db_path);

    // Role and bootstrap-account seeding, once per process
    seed::run(&config, &db, &user_store)?;

    let app = create_router(db, user_store, jwt_handler);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logitrack_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
