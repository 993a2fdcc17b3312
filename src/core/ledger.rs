//! Consumables ledger - Running stock per consumable model from typed transactions.
//!
//! Every stock change is one append-only `stock_transactions` row plus an update of the
//! model's cached `stock_quantity`, written together in a single database transaction.
//! The cache update is a compare-and-swap on the model's `version` column, so two writers
//! racing on the same model can never silently overwrite each other: the loser gets
//! [`Error::ConcurrentModification`] and nothing is written.
//!
//! The ledger is the source of truth. [`replay`] folds a model's entries in
//! `(timestamp, id)` order and must always reproduce the cached stock; [`reconcile`]
//! checks that and can repair a drifted cache.

use crate::{
    config::settings::LedgerPolicy,
    entities::{
        ConsumableModel, StockTransaction, consumable_model,
        stock_transaction::{self, StockTransactionType},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument, warn};

/// Optional context recorded alongside a stock transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionDetails {
    /// Where the goods came from (e.g., supplier or store room)
    pub location_from: Option<String>,
    /// Where the goods went (e.g., department or printer)
    pub location_to: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Result of applying one transaction to a model's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct StockOutcome {
    /// The ledger entry that was written
    pub transaction: stock_transaction::Model,
    /// Stock on hand after the entry
    pub new_stock: i64,
}

/// Outcome of comparing a model's cached stock with its replayed ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Model that was checked
    pub model_id: i64,
    /// `stock_quantity` as stored before the check
    pub cached: i64,
    /// Stock obtained by replaying every ledger entry
    pub replayed: i64,
    /// Number of ledger entries replayed
    pub entries: usize,
    /// Whether the cache was overwritten with the replayed value
    pub repaired: bool,
}

impl Reconciliation {
    /// True when the cache matched the ledger at the time of the check.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.cached == self.replayed
    }
}

/// Computes the stock level after applying one entry to `current`.
///
/// `receive` and `return` add, `issue` subtracts, and `adjust` replaces the running
/// base with `quantity`.
#[must_use]
pub const fn apply_effect(current: i64, kind: StockTransactionType, quantity: i64) -> i64 {
    match kind {
        StockTransactionType::Receive | StockTransactionType::Return => {
            current.saturating_add(quantity)
        }
        StockTransactionType::Issue => current.saturating_sub(quantity),
        StockTransactionType::Adjust => quantity,
    }
}

/// Checks the quantity constraints for a transaction type.
///
/// `receive`, `issue` and `return` need a strictly positive quantity; `adjust` takes
/// the new absolute level, which may be zero.
pub fn validate_quantity(kind: StockTransactionType, quantity: i64) -> Result<()> {
    let valid = match kind {
        StockTransactionType::Adjust => quantity >= 0,
        _ => quantity > 0,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Invalid quantity {quantity} for a {kind:?} transaction"
        )))
    }
}

/// Replays ledger entries from an empty stock in `(timestamp, id)` order.
///
/// The input does not need to be sorted.
#[must_use]
pub fn replay(entries: &[stock_transaction::Model]) -> i64 {
    let mut ordered: Vec<&stock_transaction::Model> = entries.iter().collect();
    ordered.sort_by_key(|entry| (entry.timestamp, entry.id));

    ordered.iter().fold(0, |stock, entry| {
        apply_effect(stock, entry.transaction_type, entry.quantity)
    })
}

/// Whether a model is at or below its minimum stock level.
///
/// Always computed from the row just read; low-stock is never stored.
#[must_use]
pub const fn is_low_stock(model: &consumable_model::Model) -> bool {
    model.stock_quantity <= model.min_stock_level
}

/// Applies one stock transaction to a consumable model.
///
/// Validates the quantity, loads the model inside a database transaction, computes the new
/// stock, and then writes both the ledger entry and the cached stock before committing.
/// If either write fails, neither is applied.
///
/// # Errors
/// * [`Error::Validation`] for a bad quantity, an empty actor, or an inactive model
/// * [`Error::NotFound`] if the model does not exist
/// * [`Error::InsufficientStock`] if an issue would go negative and the policy forbids it
/// * [`Error::ConcurrentModification`] if another writer changed the model meanwhile
#[instrument(skip(db, details, policy))]
pub async fn apply_transaction(
    db: &DatabaseConnection,
    model_id: i64,
    kind: StockTransactionType,
    quantity: i64,
    actor_id: String,
    details: TransactionDetails,
    policy: &LedgerPolicy,
) -> Result<StockOutcome> {
    validate_quantity(kind, quantity)?;

    if actor_id.trim().is_empty() {
        return Err(Error::validation("Actor is required for stock transactions"));
    }

    let txn = db.begin().await?;

    let model = ConsumableModel::find_by_id(model_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Consumable model",
            id: model_id,
        })?;

    let outcome = commit_from_snapshot(&txn, &model, kind, quantity, actor_id, details, policy)
        .await?;

    txn.commit().await?;

    info!(
        model_id,
        ?kind,
        quantity,
        new_stock = outcome.new_stock,
        "Stock transaction recorded"
    );

    Ok(outcome)
}

/// Writes a transaction computed from an already-read `snapshot` of the model.
///
/// The stock write only succeeds if the row still carries the snapshot's `version`.
pub(crate) async fn commit_from_snapshot<C>(
    db: &C,
    snapshot: &consumable_model::Model,
    kind: StockTransactionType,
    quantity: i64,
    actor_id: String,
    details: TransactionDetails,
    policy: &LedgerPolicy,
) -> Result<StockOutcome>
where
    C: ConnectionTrait,
{
    if !snapshot.is_active {
        return Err(Error::validation(format!(
            "Consumable model {} is inactive",
            snapshot.model_number
        )));
    }

    let new_stock = apply_effect(snapshot.stock_quantity, kind, quantity);
    // Only issues draw stock down; a receipt that leaves a backorder negative still lands
    if kind == StockTransactionType::Issue && new_stock < 0 && !policy.allow_negative_stock {
        return Err(Error::InsufficientStock {
            current: snapshot.stock_quantity,
            requested: quantity,
        });
    }

    compare_and_set_stock(db, snapshot, new_stock).await?;

    let entry = stock_transaction::ActiveModel {
        consumable_model_id: Set(snapshot.id),
        transaction_type: Set(kind),
        quantity: Set(quantity),
        stock_after: Set(new_stock),
        actor_id: Set(actor_id),
        timestamp: Set(chrono::Utc::now()),
        location_from: Set(details.location_from),
        location_to: Set(details.location_to),
        notes: Set(details.notes),
        ..Default::default()
    };
    let transaction = entry.insert(db).await?;

    Ok(StockOutcome {
        transaction,
        new_stock,
    })
}

/// Sets the cached stock only if nobody has written the row since `snapshot` was read:
/// `UPDATE consumable_models SET stock_quantity = ?, version = version + 1
///  WHERE id = ? AND version = ?`
async fn compare_and_set_stock<C>(
    db: &C,
    snapshot: &consumable_model::Model,
    new_stock: i64,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = ConsumableModel::update_many()
        .col_expr(consumable_model::Column::StockQuantity, Expr::value(new_stock))
        .col_expr(
            consumable_model::Column::Version,
            Expr::col(consumable_model::Column::Version).add(1),
        )
        .filter(consumable_model::Column::Id.eq(snapshot.id))
        .filter(consumable_model::Column::Version.eq(snapshot.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            model_id = snapshot.id,
            version = snapshot.version,
            "Stale stock write rejected"
        );
        return Err(Error::ConcurrentModification {
            entity: "Consumable model",
            id: snapshot.id,
        });
    }

    Ok(())
}

/// Retrieves the ledger of one model, newest entry first.
pub async fn get_transactions_for_model(
    db: &DatabaseConnection,
    model_id: i64,
) -> Result<Vec<stock_transaction::Model>> {
    StockTransaction::find()
        .filter(stock_transaction::Column::ConsumableModelId.eq(model_id))
        .order_by_desc(stock_transaction::Column::Timestamp)
        .order_by_desc(stock_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the most recent ledger entries across all models.
pub async fn get_recent_transactions(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<stock_transaction::Model>> {
    StockTransaction::find()
        .order_by_desc(stock_transaction::Column::Timestamp)
        .order_by_desc(stock_transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replays a model's ledger and compares it with the cached stock.
///
/// With `repair` set, a drifted cache is overwritten with the replayed value.
#[instrument(skip(db))]
pub async fn reconcile(
    db: &DatabaseConnection,
    model_id: i64,
    repair: bool,
) -> Result<Reconciliation> {
    let txn = db.begin().await?;

    let model = ConsumableModel::find_by_id(model_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "Consumable model",
            id: model_id,
        })?;

    let entries = StockTransaction::find()
        .filter(stock_transaction::Column::ConsumableModelId.eq(model_id))
        .all(&txn)
        .await?;

    let replayed = replay(&entries);
    let mut report = Reconciliation {
        model_id,
        cached: model.stock_quantity,
        replayed,
        entries: entries.len(),
        repaired: false,
    };

    if report.is_consistent() {
        debug!(model_id, stock = replayed, "Ledger consistent");
    } else {
        warn!(
            model_id,
            cached = model.stock_quantity,
            replayed,
            "Stock cache drifted from ledger"
        );
        if repair {
            compare_and_set_stock(&txn, &model, replayed).await?;
            report.repaired = true;
            info!(model_id, stock = replayed, "Stock cache repaired from ledger");
        }
    }

    txn.commit().await?;
    Ok(report)
}

/// Reconciles every consumable model, active or not.
pub async fn reconcile_all(db: &DatabaseConnection, repair: bool) -> Result<Vec<Reconciliation>> {
    let ids: Vec<i64> = ConsumableModel::find()
        .select_only()
        .column(consumable_model::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut reports = Vec::with_capacity(ids.len());
    for id in ids {
        reports.push(reconcile(db, id, repair).await?);
    }
    Ok(reports)
}
