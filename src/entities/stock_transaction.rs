//! Stock transaction entity - One immutable entry in a consumable model's ledger.
//!
//! Rows are append-only: they are never updated or deleted once written.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a transaction's `quantity` affects the running stock.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum StockTransactionType {
    /// Goods received from a supplier; adds to stock
    #[sea_orm(string_value = "receive")]
    Receive,
    /// Goods handed out; subtracts from stock
    #[sea_orm(string_value = "issue")]
    Issue,
    /// Goods returned unused; adds to stock
    #[sea_orm(string_value = "return")]
    Return,
    /// Stock count correction; `quantity` is the new absolute level
    #[sea_orm(string_value = "adjust")]
    Adjust,
}

/// Stock transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the consumable model this entry belongs to
    pub consumable_model_id: i64,
    /// Receive, issue, return or adjust
    pub transaction_type: StockTransactionType,
    /// Always non-negative; the sign comes from `transaction_type`
    pub quantity: i64,
    /// Stock level right after this entry was applied
    pub stock_after: i64,
    /// ID of the user who recorded the entry
    pub actor_id: String,
    /// When the entry was recorded
    pub timestamp: DateTimeUtc,
    /// Where the goods came from, if tracked
    pub location_from: Option<String>,
    /// Where the goods went, if tracked
    pub location_to: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between `StockTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one consumable model
    #[sea_orm(
        belongs_to = "super::consumable_model::Entity",
        from = "Column::ConsumableModelId",
        to = "super::consumable_model::Column::Id"
    )]
    ConsumableModel,
}

impl Related<super::consumable_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumableModel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
