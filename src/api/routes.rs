//! Router composition: public, authenticated, and manager-gated routes.

use crate::{
    api::{inventory, orders},
    auth::{api as auth_api, auth_middleware, require_manager, AuthState, JwtHandler, UserStore},
    cache::SnapshotCache,
    middleware::logging::request_logging,
    models::InventoryItem,
    store::Db,
};
use axum::{
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// The inventory listing tolerates up to 30 seconds of staleness.
pub const INVENTORY_CACHE_TTL: Duration = Duration::from_secs(30);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub cache: Arc<SnapshotCache<Vec<InventoryItem>>>,
}

/// Create the API router.
///
/// Route protection levels:
/// - public: health check, register/confirm/login
/// - authenticated: inventory listing, order reads, order creation
/// - Manager role: inventory writes, order deletion
pub fn create_router(
    db: Arc<Db>,
    user_store: Arc<UserStore>,
    jwt_handler: Arc<JwtHandler>,
) -> Router {
    let state = AppState {
        db,
        cache: Arc::new(SnapshotCache::new(INVENTORY_CACHE_TTL)),
    };
    let auth_state = AuthState::new(user_store, jwt_handler.clone());

    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/confirmemail", get(auth_api::confirm_email))
        .route("/api/auth/login", post(auth_api::login))
        .with_state(auth_state);

    // Write operations carry a per-method role layer; the bearer-token
    // check wraps the whole protected set below.
    let protected_routes = Router::new()
        .route(
            "/api/inventory",
            get(inventory::get_inventory).merge(
                post(inventory::add_inventory_item)
                    .route_layer(middleware::from_fn(require_manager)),
            ),
        )
        .route(
            "/api/inventory/:id",
            delete(inventory::delete_inventory_item)
                .route_layer(middleware::from_fn(require_manager)),
        )
        .route(
            "/api/orders",
            get(orders::get_orders).post(orders::create_order),
        )
        .route(
            "/api/orders/:id",
            get(orders::get_order_by_id).merge(
                delete(orders::delete_order).route_layer(middleware::from_fn(require_manager)),
            ),
        )
        .route_layer(middleware::from_fn_with_state(
            jwt_handler,
            auth_middleware,
        ))
        .with_state(state);

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
