//! Budget category entity - An allocation for one fiscal year with a running spend.
//!
//! `spent_amount` only grows through recorded expenses and never exceeds
//! `allocated_amount`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    /// Unique identifier for the budget category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name (e.g., "Printer supplies")
    pub name: String,
    /// Accounting code
    pub code: String,
    /// Fiscal year the allocation applies to
    pub fiscal_year: i32,
    /// Owning department, if any
    pub department_id: Option<i64>,
    /// Total amount allocated
    pub allocated_amount: f64,
    /// Sum of all recorded expenses
    pub spent_amount: f64,
}

/// Defines relationships between `BudgetCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One budget category has many recorded expenses
    #[sea_orm(has_many = "super::budget_expense::Entity")]
    Expenses,
}

impl Related<super::budget_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
