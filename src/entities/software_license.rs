//! Software license entity - A pool of seats for one software product.
//!
//! `used_licenses` stays within `0..=total_licenses`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Software license database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "software_licenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Vendor license key or agreement number
    #[sea_orm(unique)]
    pub license_number: String,
    pub software_name: String,
    pub vendor: Option<String>,
    /// Seats purchased
    pub total_licenses: i32,
    /// Seats currently assigned
    pub used_licenses: i32,
    pub purchase_date: Option<DateTimeUtc>,
    /// `None` for perpetual licenses
    pub expiry_date: Option<DateTimeUtc>,
    pub cost: f64,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
