//! Order endpoints.

use crate::{
    api::{ApiError, AppState},
    auth::models::Claims,
    models::{NewOrder, Order},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

/// GET /api/orders
pub async fn get_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    let start = Instant::now();
    let orders = state.db.list_orders()?;

    info!(
        count = orders.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Retrieved orders"
    );

    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn get_order_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    match state.db.get_order(id)? {
        Some(order) => {
            info!(id, item_count = order.items.len(), "Retrieved order");
            Ok(Json(order))
        }
        None => {
            warn!(id, "Order not found");
            Err(ApiError::NotFound(format!("Order with ID {id} not found.")))
        }
    }
}

/// POST /api/orders
///
/// Attaches the referenced inventory items to the new order; ids that do
/// not exist in inventory are dropped rather than rejected.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if payload.customer_name.trim().is_empty() {
        return Err(ApiError::Validation(vec![
            "Customer name is required.".to_string(),
        ]));
    }

    let date_placed = payload.date_placed.unwrap_or_else(Utc::now);
    let item_ids: Vec<i64> = payload.items.iter().map(|i| i.item_id).collect();

    let order = state
        .db
        .create_order(&payload.customer_name, date_placed, &item_ids)?;

    info!(
        order_id = order.order_id,
        customer = %order.customer_name,
        item_count = order.items.len(),
        user = %claims.sub,
        "Order created"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// DELETE /api/orders/{id} (Manager only)
///
/// Attached inventory items are removed by the persistence layer's
/// cascade rule; no orphaned items survive the order.
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.db.delete_order(id)? {
        warn!(id, "Attempt to delete non-existent order");
        return Err(ApiError::NotFound(format!("Order with ID {id} not found.")));
    }

    info!(id, user = %claims.sub, "Order deleted");

    Ok(StatusCode::NO_CONTENT)
}
