//! Contract business logic - Vendor contracts, renewal and expiry.

use crate::{
    core::expiry::{ExpiryStatus, classify_expiry},
    entities::{Contract, contract},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Attributes for a new contract.
#[derive(Debug, Clone)]
pub struct NewContract {
    pub contract_number: String,
    pub title: String,
    pub vendor: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount: f64,
}

/// Expiry label for a contract, from its end date.
#[must_use]
pub fn expiry_status(contract: &contract::Model, now: DateTime<Utc>, window: Duration) -> ExpiryStatus {
    classify_expiry(Some(contract.end_date), now, window)
}

/// Creates an active contract.
#[instrument(skip(db))]
pub async fn create_contract(
    db: &DatabaseConnection,
    new: NewContract,
) -> Result<contract::Model> {
    if new.contract_number.trim().is_empty() {
        return Err(Error::validation("Contract number cannot be empty"));
    }
    if new.title.trim().is_empty() {
        return Err(Error::validation("Contract title cannot be empty"));
    }
    if new.vendor.trim().is_empty() {
        return Err(Error::validation("Vendor cannot be empty"));
    }
    if new.end_date < new.start_date {
        return Err(Error::validation("Contract ends before it starts"));
    }
    if !new.amount.is_finite() || new.amount < 0.0 {
        return Err(Error::validation(format!("Invalid amount {}", new.amount)));
    }

    let contract = contract::ActiveModel {
        contract_number: Set(new.contract_number.trim().to_string()),
        title: Set(new.title.trim().to_string()),
        vendor: Set(new.vendor.trim().to_string()),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        amount: Set(new.amount),
        is_active: Set(true),
        ..Default::default()
    };

    contract.insert(db).await.map_err(Into::into)
}

/// Finds a contract by ID.
pub async fn get_contract_by_id(
    db: &DatabaseConnection,
    contract_id: i64,
) -> Result<Option<contract::Model>> {
    Contract::find_by_id(contract_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_contract(db: &DatabaseConnection, contract_id: i64) -> Result<contract::Model> {
    get_contract_by_id(db, contract_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Contract",
            id: contract_id,
        })
}

/// Extends a contract to `new_end_date` and reactivates it.
///
/// # Errors
/// Returns [`Error::Validation`] unless the new end date is later than the current one.
#[instrument(skip(db))]
pub async fn renew_contract(
    db: &DatabaseConnection,
    contract_id: i64,
    new_end_date: DateTime<Utc>,
) -> Result<contract::Model> {
    let contract = find_contract(db, contract_id).await?;
    if new_end_date <= contract.end_date {
        return Err(Error::validation(format!(
            "Renewal must extend past the current end date {}",
            contract.end_date.format("%Y-%m-%d")
        )));
    }

    let old_end = contract.end_date;
    let mut active: contract::ActiveModel = contract.into();
    active.end_date = Set(new_end_date);
    active.is_active = Set(true);
    let renewed = active.update(db).await?;

    info!(
        contract_id,
        from = %old_end.format("%Y-%m-%d"),
        to = %new_end_date.format("%Y-%m-%d"),
        "Contract renewed"
    );
    Ok(renewed)
}

/// Activates or terminates a contract.
pub async fn set_active(
    db: &DatabaseConnection,
    contract_id: i64,
    is_active: bool,
) -> Result<contract::Model> {
    let contract = find_contract(db, contract_id).await?;
    let mut active: contract::ActiveModel = contract.into();
    active.is_active = Set(is_active);
    active.update(db).await.map_err(Into::into)
}

/// Active contracts ending within `window` of `now`, soonest first.
pub async fn expiring_contracts(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<Vec<contract::Model>> {
    let contracts = Contract::find()
        .filter(contract::Column::IsActive.eq(true))
        .order_by_asc(contract::Column::EndDate)
        .all(db)
        .await?;

    Ok(contracts
        .into_iter()
        .filter(|contract| expiry_status(contract, now, window) == ExpiryStatus::ExpiringSoon)
        .collect())
}
