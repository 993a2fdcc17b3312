//! Shared test utilities for `itdesk`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::LedgerPolicy,
    core::{
        asset, budget, consumable,
        ledger::{self, StockOutcome, TransactionDetails},
    },
    entities::{self, AssetCondition, StockTransactionType},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test consumable model with sensible defaults.
///
/// # Defaults
/// * `name`: "Test toner {model_number}"
/// * `consumable_type`: "toner"
/// * `unit_price`: 100.0
/// * `min_stock_level`: 2
pub async fn create_test_consumable(
    db: &DatabaseConnection,
    model_number: &str,
) -> Result<entities::consumable_model::Model> {
    create_custom_consumable(db, model_number, 2).await
}

/// Creates a test consumable model with a custom low-stock threshold.
pub async fn create_custom_consumable(
    db: &DatabaseConnection,
    model_number: &str,
    min_stock_level: i64,
) -> Result<entities::consumable_model::Model> {
    consumable::create_model(
        db,
        consumable::NewConsumable {
            model_number: model_number.to_string(),
            name: format!("Test toner {model_number}"),
            color: None,
            consumable_type: "toner".to_string(),
            unit_price: 100.0,
            min_stock_level,
        },
    )
    .await
}

/// Sets up a complete test environment with one consumable model.
/// Returns (db, model) for common ledger scenarios.
pub async fn setup_with_consumable()
-> Result<(DatabaseConnection, entities::consumable_model::Model)> {
    let db = setup_test_db().await?;
    let model = create_test_consumable(&db, "TEST-001").await?;
    Ok((db, model))
}

async fn apply(
    db: &DatabaseConnection,
    model_id: i64,
    kind: StockTransactionType,
    quantity: i64,
) -> Result<StockOutcome> {
    ledger::apply_transaction(
        db,
        model_id,
        kind,
        quantity,
        "test_user".to_string(),
        TransactionDetails::default(),
        &LedgerPolicy::default(),
    )
    .await
}

/// Receives `quantity` units under the default (no backorder) policy.
pub async fn receive(db: &DatabaseConnection, model_id: i64, quantity: i64) -> Result<StockOutcome> {
    apply(db, model_id, StockTransactionType::Receive, quantity).await
}

/// Issues `quantity` units under the default (no backorder) policy.
pub async fn issue(db: &DatabaseConnection, model_id: i64, quantity: i64) -> Result<StockOutcome> {
    apply(db, model_id, StockTransactionType::Issue, quantity).await
}

/// Creates a test budget for fiscal year 2026 with nothing spent.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    allocated_amount: f64,
) -> Result<entities::budget_category::Model> {
    budget::create_budget(
        db,
        budget::NewBudget {
            name: "Printer supplies".to_string(),
            code: "IT-PS".to_string(),
            fiscal_year: 2026,
            department_id: None,
            allocated_amount,
        },
    )
    .await
}

/// Attributes for a good-condition asset named after its code.
#[must_use]
pub fn new_test_asset(asset_code: &str) -> asset::NewAsset {
    asset::NewAsset {
        asset_code: asset_code.to_string(),
        name: format!("Test asset {asset_code}"),
        serial_number: None,
        model: None,
        manufacturer: None,
        condition: AssetCondition::Good,
    }
}

/// Registers an available test asset.
pub async fn create_test_asset(
    db: &DatabaseConnection,
    asset_code: &str,
) -> Result<entities::asset::Model> {
    asset::create_asset(db, new_test_asset(asset_code), chrono::Utc::now()).await
}
