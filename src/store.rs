//! Inventory & Order Storage
//! Mission: Persist warehouse state with SQLite, cascade order deletes

use crate::models::{InventoryItem, NewInventoryItem, Order};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Inventory and order storage with SQLite backend.
pub struct Db {
    db_path: String,
    /// Full-listing reads served from the database. Exposed so callers
    /// (and tests) can observe cache effectiveness.
    list_reads: AtomicU64,
}

impl Db {
    /// Open the store and initialize the schema if needed.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
            list_reads: AtomicU64::new(0),
        };
        store.init_db()?;
        Ok(store)
    }

    fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        // SQLite leaves foreign keys off per connection; the order -> item
        // cascade depends on them.
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS orders (
                order_id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_name TEXT NOT NULL,
                date_placed TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS inventory_items (
                item_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                location TEXT NOT NULL,
                order_id INTEGER REFERENCES orders(order_id) ON DELETE CASCADE
            )",
            [],
        )?;

        Ok(())
    }

    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
        Ok(InventoryItem {
            item_id: row.get(0)?,
            name: row.get(1)?,
            quantity: row.get(2)?,
            location: row.get(3)?,
            order_id: row.get(4)?,
        })
    }

    /// Full inventory listing. Counted so the cached read path is observable.
    pub fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        self.list_reads.fetch_add(1, Ordering::Relaxed);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, name, quantity, location, order_id
             FROM inventory_items ORDER BY item_id",
        )?;
        let items = stmt
            .query_map([], Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Number of full-listing reads that reached the database.
    pub fn list_reads(&self) -> u64 {
        self.list_reads.load(Ordering::Relaxed)
    }

    pub fn get_inventory_item(&self, item_id: i64) -> Result<Option<InventoryItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, name, quantity, location, order_id
             FROM inventory_items WHERE item_id = ?1",
        )?;

        match stmt.query_row(params![item_id], Self::row_to_item) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_inventory_item(&self, new: &NewInventoryItem) -> Result<InventoryItem> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO inventory_items (name, quantity, location) VALUES (?1, ?2, ?3)",
            params![new.name, new.quantity, new.location],
        )
        .context("Failed to insert inventory item")?;

        let item_id = conn.last_insert_rowid();
        Ok(InventoryItem {
            item_id,
            name: new.name.clone(),
            quantity: new.quantity,
            location: new.location.clone(),
            order_id: None,
        })
    }

    /// Delete an item by id. Returns false when no such item exists.
    pub fn delete_inventory_item(&self, item_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM inventory_items WHERE item_id = ?1",
            params![item_id],
        )?;
        Ok(rows > 0)
    }

    fn items_for_order(conn: &Connection, order_id: i64) -> Result<Vec<InventoryItem>> {
        let mut stmt = conn.prepare(
            "SELECT item_id, name, quantity, location, order_id
             FROM inventory_items WHERE order_id = ?1 ORDER BY item_id",
        )?;
        let items = stmt
            .query_map(params![order_id], Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn parse_date(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    column,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    pub fn list_orders(&self) -> Result<Vec<Order>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT order_id, customer_name, date_placed FROM orders ORDER BY order_id")?;

        let headers = stmt
            .query_map([], |row| {
                let raw: String = row.get(2)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    Self::parse_date(2, &raw)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut orders = Vec::with_capacity(headers.len());
        for (order_id, customer_name, date_placed) in headers {
            orders.push(Order {
                order_id,
                customer_name,
                date_placed,
                items: Self::items_for_order(&conn, order_id)?,
            });
        }
        Ok(orders)
    }

    pub fn get_order(&self, order_id: i64) -> Result<Option<Order>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT order_id, customer_name, date_placed FROM orders WHERE order_id = ?1")?;

        let header = stmt.query_row(params![order_id], |row| {
            let raw: String = row.get(2)?;
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                Self::parse_date(2, &raw)?,
            ))
        });

        match header {
            Ok((order_id, customer_name, date_placed)) => Ok(Some(Order {
                order_id,
                customer_name,
                date_placed,
                items: Self::items_for_order(&conn, order_id)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create an order and attach the given inventory items to it.
    ///
    /// Ids that do not exist in inventory are dropped silently; the UPDATE
    /// simply affects zero rows for them.
    pub fn create_order(
        &self,
        customer_name: &str,
        date_placed: DateTime<Utc>,
        item_ids: &[i64],
    ) -> Result<Order> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO orders (customer_name, date_placed) VALUES (?1, ?2)",
            params![customer_name, date_placed.to_rfc3339()],
        )
        .context("Failed to insert order")?;

        let order_id = conn.last_insert_rowid();
        for item_id in item_ids {
            conn.execute(
                "UPDATE inventory_items SET order_id = ?1 WHERE item_id = ?2",
                params![order_id, item_id],
            )?;
        }

        info!(
            order_id,
            customer = customer_name,
            requested_items = item_ids.len(),
            "Order created"
        );

        Ok(Order {
            order_id,
            customer_name: customer_name.to_string(),
            date_placed,
            items: Self::items_for_order(&conn, order_id)?,
        })
    }

    /// Delete an order; the foreign-key rule cascades to attached items.
    /// Returns false when no such order exists.
    pub fn delete_order(&self, order_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM orders WHERE order_id = ?1", params![order_id])?;
        Ok(rows > 0)
    }
}
