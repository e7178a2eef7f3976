use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stocked item, optionally attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub location: String,
    /// Owning order, if the item has been attached to one. Maintained by
    /// the foreign-key cascade rule, never mutated directly by handlers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
}

/// A customer order with its attached inventory items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    pub customer_name: String,
    pub date_placed: DateTime<Utc>,
    pub items: Vec<InventoryItem>,
}

/// Request body for POST /api/inventory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: i64,
    pub location: String,
}

/// Request body for POST /api/orders
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    /// Defaults to the current time when omitted.
    #[serde(default)]
    pub date_placed: Option<DateTime<Utc>>,
    /// Item ids to attach. Ids not present in inventory are dropped.
    #[serde(default)]
    pub items: Vec<OrderItemRef>,
}

/// Reference to an existing inventory item by id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRef {
    pub item_id: i64,
}
