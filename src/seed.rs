//! Startup Seeding
//! Mission: Idempotent role and bootstrap-account setup, off the request path

use crate::{
    auth::{models::Role, UserStore},
    config::Config,
    models::NewInventoryItem,
    store::Db,
};
use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

/// Run once at process initialization, never on the request path.
///
/// Ensures the {Manager, User} roles exist and that exactly one bootstrap
/// Manager account is present. Both steps are idempotent across restarts.
pub fn run(config: &Config, db: &Db, users: &UserStore) -> Result<()> {
    users.ensure_role(Role::Manager)?;
    users.ensure_role(Role::User)?;

    if !users.any_user_with_role(Role::Manager)? {
        let admin = users.create_user(&config.admin_email, &config.admin_password)?;
        users.add_role(&admin.id, Role::Manager)?;
        // Bootstrap account skips the confirmation loop
        users.mark_email_confirmed(&admin.id)?;

        info!("🔐 Bootstrap manager account created: {}", config.admin_email);
        warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
    }

    if config.seed_demo_data {
        seed_demo_data(db)?;
    }

    Ok(())
}

fn seed_demo_data(db: &Db) -> Result<()> {
    if db.list_inventory()?.is_empty() {
        db.insert_inventory_item(&NewInventoryItem {
            name: "Pallet Jack".to_string(),
            quantity: 12,
            location: "Warehouse A".to_string(),
        })?;
        db.insert_inventory_item(&NewInventoryItem {
            name: "Forklift".to_string(),
            quantity: 3,
            location: "Warehouse B".to_string(),
        })?;
        info!("✅ Seeded demo inventory items");
    }

    if db.list_orders()?.is_empty() {
        let item_ids: Vec<i64> = db
            .list_inventory()?
            .iter()
            .take(2)
            .map(|i| i.item_id)
            .collect();
        db.create_order("Samir", Utc::now(), &item_ids)?;
        info!("✅ Seeded demo order");
    }

    Ok(())
}
