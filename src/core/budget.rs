//! Budget business logic - Allocations, expense recording and utilization buckets.
//!
//! `spent_amount` only grows through [`record_expense`], and never exceeds
//! `allocated_amount` by [`AMOUNT_TOLERANCE`] or more. Both the spend increment and
//! allocation changes are single conditional `UPDATE` statements that carry the invariant in their `WHERE` clause, so
//! concurrent writers cannot push a budget over its allocation.

use crate::{
    entities::{BudgetCategory, BudgetExpense, budget_category, budget_expense},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Spend share at which a budget is flagged for caution
pub const CAUTION_PERCENT: f64 = 75.0;
/// Spend share at which a budget is flagged as critical
pub const CRITICAL_PERCENT: f64 = 90.0;
/// Half a cent. Amounts are compared with this slack so binary rounding of decimal
/// amounts (0.1 + 0.2) cannot reject a spend that fits to the cent.
pub const AMOUNT_TOLERANCE: f64 = 0.005;

/// Whether `total` is over `limit` by at least half a cent.
#[must_use]
pub fn exceeds(total: f64, limit: f64) -> bool {
    total - limit > AMOUNT_TOLERANCE
}

/// Display bucket for how much of a budget is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationBucket {
    /// Below 75%
    Normal,
    /// 75% up to but not including 90%
    Caution,
    /// 90% and above
    Critical,
}

/// Attributes for creating a budget category.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub code: String,
    pub fiscal_year: i32,
    pub department_id: Option<i64>,
    pub allocated_amount: f64,
}

/// A budget together with its derived utilization figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub budget: budget_category::Model,
    pub remaining: f64,
    pub percent_used: f64,
    pub bucket: UtilizationBucket,
}

/// Percentage of the allocation that has been spent.
///
/// A zero allocation reports 0%: nothing can be spent against it.
#[must_use]
pub fn utilization_percent(spent: f64, allocated: f64) -> f64 {
    if allocated <= 0.0 {
        return 0.0;
    }
    (spent / allocated) * 100.0
}

/// Buckets a spend share: `<75%` normal, `75–89%` caution, `>=90%` critical.
#[must_use]
pub fn utilization_bucket(spent: f64, allocated: f64) -> UtilizationBucket {
    let percent = utilization_percent(spent, allocated);
    if percent >= CRITICAL_PERCENT {
        UtilizationBucket::Critical
    } else if percent >= CAUTION_PERCENT {
        UtilizationBucket::Caution
    } else {
        UtilizationBucket::Normal
    }
}

/// Derives the remaining amount, percentage and bucket for a budget row.
#[must_use]
pub fn summarize(budget: budget_category::Model) -> BudgetSummary {
    let percent_used = utilization_percent(budget.spent_amount, budget.allocated_amount);
    let bucket = utilization_bucket(budget.spent_amount, budget.allocated_amount);
    BudgetSummary {
        remaining: budget.allocated_amount - budget.spent_amount,
        percent_used,
        bucket,
        budget,
    }
}

fn validate_amount(amount: f64, allow_zero: bool) -> Result<()> {
    let positive_enough = if allow_zero { amount >= 0.0 } else { amount > 0.0 };
    if !amount.is_finite() || !positive_enough {
        return Err(Error::validation(format!("Invalid amount {amount}")));
    }
    Ok(())
}

/// Creates a budget category with nothing spent.
#[instrument(skip(db))]
pub async fn create_budget(
    db: &DatabaseConnection,
    new: NewBudget,
) -> Result<budget_category::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::validation("Budget name cannot be empty"));
    }
    if new.code.trim().is_empty() {
        return Err(Error::validation("Budget code cannot be empty"));
    }
    if new.fiscal_year <= 0 {
        return Err(Error::validation(format!(
            "Invalid fiscal year {}",
            new.fiscal_year
        )));
    }
    validate_amount(new.allocated_amount, true)?;

    let budget = budget_category::ActiveModel {
        name: Set(new.name.trim().to_string()),
        code: Set(new.code.trim().to_string()),
        fiscal_year: Set(new.fiscal_year),
        department_id: Set(new.department_id),
        allocated_amount: Set(new.allocated_amount),
        spent_amount: Set(0.0),
        ..Default::default()
    };

    budget.insert(db).await.map_err(Into::into)
}

/// Finds a budget category by ID.
pub async fn get_budget_by_id(
    db: &DatabaseConnection,
    budget_id: i64,
) -> Result<Option<budget_category::Model>> {
    BudgetCategory::find_by_id(budget_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists budgets ordered by code, optionally restricted to one fiscal year.
pub async fn list_budgets(
    db: &DatabaseConnection,
    fiscal_year: Option<i32>,
) -> Result<Vec<budget_category::Model>> {
    let mut query = BudgetCategory::find();
    if let Some(year) = fiscal_year {
        query = query.filter(budget_category::Column::FiscalYear.eq(year));
    }
    query
        .order_by_asc(budget_category::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Records an expense against a budget.
///
/// The increment and the expense row are written in one database transaction. The
/// increment itself is `UPDATE … SET spent = spent + ? WHERE id = ? AND spent + ? <=
/// allocated + tolerance`, so a concurrent expense can never push the budget over its allocation.
///
/// # Errors
/// * [`Error::Validation`] for a non-positive or non-finite amount, or an empty description
/// * [`Error::NotFound`] if the budget does not exist
/// * [`Error::BudgetExceeded`] if the expense would overflow the allocation; nothing changes
#[instrument(skip(db))]
pub async fn record_expense(
    db: &DatabaseConnection,
    budget_id: i64,
    amount: f64,
    description: &str,
) -> Result<budget_category::Model> {
    validate_amount(amount, false)?;
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::validation("Expense description cannot be empty"));
    }

    let txn = db.begin().await?;

    let budget = BudgetCategory::find_by_id(budget_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Budget",
            id: budget_id,
        })?;

    if exceeds(budget.spent_amount + amount, budget.allocated_amount) {
        warn!(
            budget_id,
            allocated = budget.allocated_amount,
            spent = budget.spent_amount,
            amount,
            "Expense rejected: budget exceeded"
        );
        return Err(Error::BudgetExceeded {
            allocated: budget.allocated_amount,
            spent: budget.spent_amount,
            requested: amount,
        });
    }

    let result = BudgetCategory::update_many()
        .col_expr(
            budget_category::Column::SpentAmount,
            Expr::col(budget_category::Column::SpentAmount).add(amount),
        )
        .filter(budget_category::Column::Id.eq(budget_id))
        .filter(
            Expr::expr(Expr::col(budget_category::Column::SpentAmount).add(amount))
                .lte(Expr::col(budget_category::Column::AllocatedAmount).add(AMOUNT_TOLERANCE)),
        )
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        // Another expense landed between our read and the guarded update
        return Err(Error::BudgetExceeded {
            allocated: budget.allocated_amount,
            spent: budget.spent_amount,
            requested: amount,
        });
    }

    let expense = budget_expense::ActiveModel {
        budget_category_id: Set(budget_id),
        amount: Set(amount),
        description: Set(description.to_string()),
        recorded_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    expense.insert(&txn).await?;

    let updated = BudgetCategory::find_by_id(budget_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Budget",
            id: budget_id,
        })?;

    txn.commit().await?;

    info!(
        budget_id,
        amount,
        spent = updated.spent_amount,
        "Expense recorded"
    );
    Ok(updated)
}

/// Changes a budget's allocation.
///
/// # Errors
/// Returns [`Error::Validation`] if the new allocation is below what has already been spent.
#[instrument(skip(db))]
pub async fn adjust_allocation(
    db: &DatabaseConnection,
    budget_id: i64,
    new_allocated: f64,
) -> Result<budget_category::Model> {
    validate_amount(new_allocated, true)?;

    let budget = get_budget_by_id(db, budget_id).await?.ok_or(Error::NotFound {
        entity: "Budget",
        id: budget_id,
    })?;

    let result = BudgetCategory::update_many()
        .col_expr(
            budget_category::Column::AllocatedAmount,
            Expr::value(new_allocated),
        )
        .filter(budget_category::Column::Id.eq(budget_id))
        .filter(budget_category::Column::SpentAmount.lte(new_allocated + AMOUNT_TOLERANCE))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::validation(format!(
            "Allocation {new_allocated:.2} is below the {:.2} already spent",
            budget.spent_amount
        )));
    }

    info!(
        budget_id,
        old = budget.allocated_amount,
        new = new_allocated,
        "Budget allocation adjusted"
    );

    get_budget_by_id(db, budget_id).await?.ok_or(Error::NotFound {
        entity: "Budget",
        id: budget_id,
    })
}

/// Lists the expenses recorded against a budget, newest first.
pub async fn list_expenses(
    db: &DatabaseConnection,
    budget_id: i64,
) -> Result<Vec<budget_expense::Model>> {
    BudgetExpense::find()
        .filter(budget_expense::Column::BudgetCategoryId.eq(budget_id))
        .order_by_desc(budget_expense::Column::RecordedAt)
        .order_by_desc(budget_expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a budget together with its expense records.
#[instrument(skip(db))]
pub async fn delete_budget(db: &DatabaseConnection, budget_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let budget = BudgetCategory::find_by_id(budget_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Budget",
            id: budget_id,
        })?;

    BudgetExpense::delete_many()
        .filter(budget_expense::Column::BudgetCategoryId.eq(budget_id))
        .exec(&txn)
        .await?;
    budget.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_utilization_bucket_boundaries() {
        assert_eq!(utilization_bucket(0.0, 1000.0), UtilizationBucket::Normal);
        assert_eq!(utilization_bucket(749.0, 1000.0), UtilizationBucket::Normal);
        assert_eq!(utilization_bucket(750.0, 1000.0), UtilizationBucket::Caution);
        assert_eq!(utilization_bucket(899.0, 1000.0), UtilizationBucket::Caution);
        assert_eq!(utilization_bucket(900.0, 1000.0), UtilizationBucket::Critical);
        assert_eq!(utilization_bucket(1000.0, 1000.0), UtilizationBucket::Critical);
    }

    #[test]
    fn test_utilization_zero_allocation() {
        assert_eq!(utilization_percent(0.0, 0.0), 0.0);
        assert_eq!(utilization_bucket(0.0, 0.0), UtilizationBucket::Normal);
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(budget_category::Model {
            id: 1,
            name: "Printer supplies".to_string(),
            code: "IT-PS".to_string(),
            fiscal_year: 2026,
            department_id: None,
            allocated_amount: 1000.0,
            spent_amount: 800.0,
        });
        assert_eq!(summary.remaining, 200.0);
        assert_eq!(summary.percent_used, 80.0);
        assert_eq!(summary.bucket, UtilizationBucket::Caution);
    }

    #[tokio::test]
    async fn test_record_expense_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = record_expense(&db, 1, amount, "paper").await;
            assert!(matches!(result, Err(Error::Validation { .. })));
        }

        let result = record_expense(&db, 1, 10.0, "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_record_expense_over_budget_mock() -> Result<()> {
        let budget = budget_category::Model {
            id: 1,
            name: "Printer supplies".to_string(),
            code: "IT-PS".to_string(),
            fiscal_year: 2026,
            department_id: None,
            allocated_amount: 1000.0,
            spent_amount: 900.0,
        };

        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![budget]])
            .into_connection();

        let result = record_expense(&db, 1, 200.0, "Toner order").await;
        assert!(matches!(
            result,
            Err(Error::BudgetExceeded {
                allocated: 1000.0,
                spent: 900.0,
                requested: 200.0
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_record_expense_over_budget_leaves_spent_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let budget = create_test_budget(&db, 1000.0).await?;
        record_expense(&db, budget.id, 900.0, "Laser printers").await?;

        let result = record_expense(&db, budget.id, 200.0, "Toner order").await;
        assert!(matches!(result, Err(Error::BudgetExceeded { .. })));

        let stored = get_budget_by_id(&db, budget.id).await?.unwrap();
        assert_eq!(stored.spent_amount, 900.0);
        assert_eq!(list_expenses(&db, budget.id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_expense_up_to_allocation() -> Result<()> {
        let db = setup_test_db().await?;
        let budget = create_test_budget(&db, 1000.0).await?;

        record_expense(&db, budget.id, 600.0, "Laptops").await?;
        let updated = record_expense(&db, budget.id, 400.0, "Monitors").await?;
        assert_eq!(updated.spent_amount, 1000.0);
        assert_eq!(summarize(updated).bucket, UtilizationBucket::Critical);

        let expenses = list_expenses(&db, budget.id).await?;
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description, "Monitors");
        assert_eq!(expenses[1].description, "Laptops");

        Ok(())
    }

    #[test]
    fn test_exceeds_ignores_sub_cent_rounding() {
        assert!(!exceeds(0.1 + 0.2, 0.3));
        assert!(!exceeds(1000.0, 1000.0));
        assert!(exceeds(1000.01, 1000.0));
    }

    #[tokio::test]
    async fn test_decimal_expenses_fill_allocation_exactly() -> Result<()> {
        let db = setup_test_db().await?;
        let budget = create_test_budget(&db, 0.3).await?;

        record_expense(&db, budget.id, 0.1, "Cable ties").await?;
        let updated = record_expense(&db, budget.id, 0.2, "Labels").await?;
        assert!((updated.spent_amount - 0.3).abs() < 1e-9);

        let result = record_expense(&db, budget.id, 0.01, "Screws").await;
        assert!(matches!(result, Err(Error::BudgetExceeded { .. })));

        // Spent is 0.1 + 0.2 in binary; an allocation of exactly 0.3 must still be accepted
        let adjusted = adjust_allocation(&db, budget.id, 0.3).await?;
        assert_eq!(adjusted.allocated_amount, 0.3);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_expense_missing_budget() -> Result<()> {
        let db = setup_test_db().await?;
        let result = record_expense(&db, 42, 1.0, "Cables").await;
        assert!(matches!(result, Err(Error::NotFound { id: 42, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_budget_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_budget(
            &db,
            NewBudget {
                name: "Network".to_string(),
                code: String::new(),
                fiscal_year: 2026,
                department_id: None,
                allocated_amount: 10.0,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_budget(
            &db,
            NewBudget {
                name: "Network".to_string(),
                code: "NET".to_string(),
                fiscal_year: 2026,
                department_id: None,
                allocated_amount: -1.0,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_allocation_cannot_drop_below_spent() -> Result<()> {
        let db = setup_test_db().await?;
        let budget = create_test_budget(&db, 1000.0).await?;
        record_expense(&db, budget.id, 500.0, "Switches").await?;

        let result = adjust_allocation(&db, budget.id, 400.0).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let adjusted = adjust_allocation(&db, budget.id, 500.0).await?;
        assert_eq!(adjusted.allocated_amount, 500.0);

        let adjusted = adjust_allocation(&db, budget.id, 2000.0).await?;
        assert_eq!(adjusted.allocated_amount, 2000.0);
        assert_eq!(adjusted.spent_amount, 500.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_budgets_by_year() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_budget(&db, 100.0).await?;
        create_budget(
            &db,
            NewBudget {
                name: "Servers".to_string(),
                code: "IT-SV".to_string(),
                fiscal_year: 2027,
                department_id: Some(3),
                allocated_amount: 5000.0,
            },
        )
        .await?;

        assert_eq!(list_budgets(&db, None).await?.len(), 2);
        let next_year = list_budgets(&db, Some(2027)).await?;
        assert_eq!(next_year.len(), 1);
        assert_eq!(next_year[0].code, "IT-SV");

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_budget_removes_expenses() -> Result<()> {
        let db = setup_test_db().await?;
        let budget = create_test_budget(&db, 100.0).await?;
        record_expense(&db, budget.id, 10.0, "Mouse").await?;

        delete_budget(&db, budget.id).await?;
        assert!(get_budget_by_id(&db, budget.id).await?.is_none());
        assert!(list_expenses(&db, budget.id).await?.is_empty());

        Ok(())
    }
}
