//! Budget expense entity - Append-only record of each accepted expense.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub budget_category_id: i64,
    pub amount: f64,
    pub description: String,
    pub recorded_at: DateTimeUtc,
}

/// Defines relationships between `BudgetExpense` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one budget category
    #[sea_orm(
        belongs_to = "super::budget_category::Entity",
        from = "Column::BudgetCategoryId",
        to = "super::budget_category::Column::Id"
    )]
    BudgetCategory,
}

impl Related<super::budget_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
