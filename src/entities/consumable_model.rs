//! Consumable model entity - A stockable consumable type such as a toner cartridge.
//!
//! `stock_quantity` is a cached running total of the model's ledger; the ledger in
//! `stock_transactions` is the source of truth. `version` increments on every stock
//! write and guards the cache against lost updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Consumable model database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumable_models")]
pub struct Model {
    /// Unique identifier for the consumable model
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Manufacturer model number (e.g., "CF226A"), unique across models
    #[sea_orm(unique)]
    pub model_number: String,
    /// Human-readable name
    pub name: String,
    /// Optional color (e.g., "black", "cyan")
    pub color: Option<String>,
    /// Consumable kind (e.g., "toner", "drum", "ink")
    pub consumable_type: String,
    /// Price per unit
    pub unit_price: f64,
    /// Stock at or below this level is reported as low
    pub min_stock_level: i64,
    /// Cached stock on hand, reproduced exactly by replaying the ledger
    pub stock_quantity: i64,
    /// Optimistic-concurrency counter, bumped on every stock write
    pub version: i64,
    /// Soft delete flag - inactive models keep their ledger but accept no new transactions
    pub is_active: bool,
}

/// Defines relationships between `ConsumableModel` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One model has many stock transactions
    #[sea_orm(has_many = "super::stock_transaction::Entity")]
    StockTransactions,
}

impl Related<super::stock_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
