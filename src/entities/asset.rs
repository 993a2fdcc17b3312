//! Asset entity - One piece of IT equipment in the inventory.
//!
//! Maintenance schedules and borrow requests reference assets by `id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an asset
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    #[sea_orm(string_value = "available")]
    Available,
    /// Assigned to a user
    #[sea_orm(string_value = "in_use")]
    InUse,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
    #[sea_orm(string_value = "retired")]
    Retired,
    #[sea_orm(string_value = "lost")]
    Lost,
}

/// Physical condition, recorded by whoever inspects the asset
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AssetCondition {
    #[sea_orm(string_value = "excellent")]
    Excellent,
    #[sea_orm(string_value = "good")]
    Good,
    #[sea_orm(string_value = "fair")]
    Fair,
    #[sea_orm(string_value = "poor")]
    Poor,
}

/// Asset database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    /// Unique identifier for the asset
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Inventory tag (e.g., "NB-0042"), unique across assets
    #[sea_orm(unique)]
    pub asset_code: String,
    /// Human-readable name
    pub name: String,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    /// Current lifecycle status
    pub status: AssetStatus,
    pub condition: AssetCondition,
    /// User the asset is assigned to while `in_use`
    pub assigned_to: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `Asset` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One asset has many PM schedules
    #[sea_orm(has_many = "super::maintenance_schedule::Entity")]
    MaintenanceSchedules,
    /// One asset has many borrow requests
    #[sea_orm(has_many = "super::borrow_request::Entity")]
    BorrowRequests,
}

impl Related<super::maintenance_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceSchedules.def()
    }
}

impl Related<super::borrow_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BorrowRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
