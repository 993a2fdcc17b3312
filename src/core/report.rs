//! Report generation business logic.
//!
//! Builds the per-model stock report and the cross-module status digest (low stock,
//! PM due dates, budget pressure, expiries and overdue loans). All functions return
//! structured data; the `format_*` helpers render one-line text for logs.

use crate::{
    config::settings::StatusWindows,
    core::{
        borrow,
        budget::{self, BudgetSummary, UtilizationBucket},
        consumable, contract, ledger, license,
        maintenance::{self, DueStatus},
    },
    entities::{
        BorrowRequestModel, ContractModel, MaintenanceScheduleModel, SoftwareLicenseModel,
        StockTransactionType, consumable_model, stock_transaction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Stock position of one consumable model with its latest ledger entries.
#[derive(Debug, Clone)]
pub struct StockReport {
    /// The model being reported on
    pub model: consumable_model::Model,
    /// Whether stock is at or below the model's minimum
    pub is_low_stock: bool,
    /// Newest ledger entries first
    pub recent_transactions: Vec<stock_transaction::Model>,
}

/// Everything that needs attention at a point in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusDigest {
    pub low_stock: Vec<consumable_model::Model>,
    pub overdue_pm: Vec<MaintenanceScheduleModel>,
    pub due_soon_pm: Vec<MaintenanceScheduleModel>,
    pub critical_budgets: Vec<BudgetSummary>,
    pub expiring_licenses: Vec<SoftwareLicenseModel>,
    pub expiring_contracts: Vec<ContractModel>,
    pub overdue_borrows: Vec<BorrowRequestModel>,
}

impl StatusDigest {
    /// True when nothing in the digest needs attention.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.low_stock.is_empty()
            && self.overdue_pm.is_empty()
            && self.due_soon_pm.is_empty()
            && self.critical_budgets.is_empty()
            && self.expiring_licenses.is_empty()
            && self.expiring_contracts.is_empty()
            && self.overdue_borrows.is_empty()
    }
}

/// Generates a stock report for one consumable model.
///
/// # Arguments
/// * `db` - Database connection
/// * `model_id` - ID of the consumable model
/// * `transaction_limit` - Maximum number of ledger entries to include (default 10)
pub async fn generate_stock_report(
    db: &DatabaseConnection,
    model_id: i64,
    transaction_limit: Option<u64>,
) -> Result<StockReport> {
    let model = consumable::get_model_by_id(db, model_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Consumable model",
            id: model_id,
        })?;

    let limit = transaction_limit.unwrap_or(10);
    let recent_transactions: Vec<stock_transaction::Model> =
        ledger::get_transactions_for_model(db, model_id)
            .await?
            .into_iter()
            .take(limit.try_into()?)
            .collect();

    Ok(StockReport {
        is_low_stock: ledger::is_low_stock(&model),
        model,
        recent_transactions,
    })
}

/// Collects the status digest as of `now`.
pub async fn generate_digest(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    windows: &StatusWindows,
) -> Result<StatusDigest> {
    let mut digest = StatusDigest {
        low_stock: consumable::low_stock_models(db).await?,
        ..StatusDigest::default()
    };

    for (schedule, status) in
        maintenance::list_schedules_with_status(db, now, windows.due_soon_window()).await?
    {
        match status {
            DueStatus::Overdue => digest.overdue_pm.push(schedule),
            DueStatus::DueSoon => digest.due_soon_pm.push(schedule),
            DueStatus::Normal | DueStatus::Inactive => {}
        }
    }

    digest.critical_budgets = budget::list_budgets(db, None)
        .await?
        .into_iter()
        .map(budget::summarize)
        .filter(|summary| summary.bucket == UtilizationBucket::Critical)
        .collect();

    digest.expiring_licenses = license::expiring_licenses(db, now, windows.expiry_window()).await?;
    digest.expiring_contracts =
        contract::expiring_contracts(db, now, windows.expiry_window()).await?;
    digest.overdue_borrows = borrow::overdue_requests(db, now).await?;

    Ok(digest)
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based bar like: `[████████░░] 80.0%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// One-line budget summary, e.g. `IT-PS Printer supplies [█████████░] 92.0% (800.00 left)`.
#[must_use]
pub fn format_budget_summary(summary: &BudgetSummary) -> String {
    format!(
        "{} {} {} ({:.2} left)",
        summary.budget.code,
        summary.budget.name,
        format_progress_bar(summary.percent_used, None),
        summary.remaining
    )
}

/// Signed quantity of a ledger entry: `+5` for receipts, `-3` for issues, `=12` for counts.
#[must_use]
pub fn format_stock_movement(kind: StockTransactionType, quantity: i64) -> String {
    match kind {
        StockTransactionType::Receive | StockTransactionType::Return => format!("+{quantity}"),
        StockTransactionType::Issue => format!("-{quantity}"),
        StockTransactionType::Adjust => format!("={quantity}"),
    }
}

/// Generates a summary line for a ledger entry.
#[must_use]
pub fn format_transaction_summary(transaction: &stock_transaction::Model) -> String {
    let movement = format_stock_movement(transaction.transaction_type, transaction.quantity);
    format!(
        "{movement} | {:?} | stock {} | by {}",
        transaction.transaction_type, transaction.stock_after, transaction.actor_id
    )
}
