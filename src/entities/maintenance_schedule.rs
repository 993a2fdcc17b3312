//! Maintenance schedule entity - A preventive-maintenance (PM) plan for one asset.
//!
//! Due status (overdue, due soon) is never stored; see `core::maintenance::classify`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow status of a PM schedule
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PmStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Maintenance schedule database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "maintenance_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Asset under maintenance
    pub asset_id: i64,
    /// Short label for the plan (e.g., "Quarterly printer cleaning")
    pub name: String,
    /// Interval between maintenance runs
    pub frequency_days: i32,
    pub next_due_date: DateTimeUtc,
    pub last_completed_date: Option<DateTimeUtc>,
    /// Inactive schedules are never reported as due
    pub is_active: bool,
    pub status: PmStatus,
    /// Who performed the last completed run
    pub performed_by: Option<String>,
    pub notes: Option<String>,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `MaintenanceSchedule` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each schedule belongs to one asset
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
