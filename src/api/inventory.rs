//! Inventory endpoints with the cache-backed read path.

use crate::{
    api::{ApiError, AppState},
    auth::models::Claims,
    models::{InventoryItem, NewInventoryItem},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::time::Instant;
use tracing::{info, warn};

/// GET /api/inventory
///
/// Hit: serve the cached snapshot without touching persistence.
/// Miss (absent or expired): read the store, fill the slot, serve fresh.
pub async fn get_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let start = Instant::now();

    if let Some(items) = state.cache.get() {
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Inventory retrieved from cache"
        );
        return Ok(Json(items));
    }

    let items = state.db.list_inventory()?;
    state.cache.set(items.clone());

    info!(
        count = items.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Inventory retrieved from store and cached"
    );

    Ok(Json(items))
}

/// POST /api/inventory (Manager only)
pub async fn add_inventory_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NewInventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let mut errors = Vec::new();
    if payload.name.trim().is_empty() {
        errors.push("Name is required.".to_string());
    }
    if payload.location.trim().is_empty() {
        errors.push("Location is required.".to_string());
    }
    if payload.quantity < 0 {
        errors.push("Quantity must be non-negative.".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let item = state.db.insert_inventory_item(&payload)?;

    // Eager invalidation: the next listing must not see pre-mutation data,
    // no matter how much TTL the current entry has left.
    state.cache.invalidate();

    info!(
        item = %item.name,
        item_id = item.item_id,
        user = %claims.sub,
        "Inventory item added. Cache invalidated."
    );

    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/inventory/{id} (Manager only)
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let Some(item) = state.db.get_inventory_item(id)? else {
        warn!(id, "Attempt to delete non-existent inventory item");
        return Err(ApiError::NotFound(format!(
            "Inventory item with ID {id} not found."
        )));
    };

    state.db.delete_inventory_item(id)?;
    state.cache.invalidate();

    info!(
        item = %item.name,
        id,
        user = %claims.sub,
        "Inventory item deleted. Cache invalidated."
    );

    Ok(StatusCode::NO_CONTENT)
}
