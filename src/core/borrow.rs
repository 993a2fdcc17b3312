//! Asset borrowing business logic - Requests, approvals, handover and return.
//!
//! Each status change is written with a filter on the status it was checked against, so
//! two approvers racing on one request cannot both succeed.

use crate::{
    core::{asset, workflow::ensure_transition},
    entities::{AssetStatus, BorrowRequest, BorrowStatus, borrow_request},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Attributes for a new borrow request.
#[derive(Debug, Clone)]
pub struct NewBorrowRequest {
    pub asset_id: i64,
    pub requester_id: String,
    pub purpose: Option<String>,
    pub expected_return_date: DateTime<Utc>,
}

/// A loan is overdue once it is approved or handed over and its return date has passed.
#[must_use]
pub fn is_overdue(request: &borrow_request::Model, now: DateTime<Utc>) -> bool {
    matches!(
        request.status,
        BorrowStatus::Approved | BorrowStatus::Borrowed
    ) && request.expected_return_date < now
}

/// Files a pending borrow request.
///
/// # Errors
/// * [`Error::NotFound`] if the asset does not exist
/// * [`Error::Validation`] for a retired or lost asset, an empty requester or a return
///   date not after `now`
#[instrument(skip(db, new), fields(asset_id = new.asset_id))]
pub async fn create_request(
    db: &DatabaseConnection,
    new: NewBorrowRequest,
    now: DateTime<Utc>,
) -> Result<borrow_request::Model> {
    if new.requester_id.trim().is_empty() {
        return Err(Error::validation("Requester cannot be empty"));
    }
    if new.expected_return_date <= now {
        return Err(Error::validation("Expected return date must be in the future"));
    }

    let asset = asset::find_asset(db, new.asset_id).await?;
    if matches!(asset.status, AssetStatus::Retired | AssetStatus::Lost) {
        return Err(Error::validation(format!(
            "Asset {} is {} and cannot be borrowed",
            asset.asset_code,
            asset.status.to_value()
        )));
    }

    let request = borrow_request::ActiveModel {
        asset_id: Set(new.asset_id),
        requester_id: Set(new.requester_id),
        purpose: Set(new.purpose),
        status: Set(BorrowStatus::Pending),
        expected_return_date: Set(new.expected_return_date),
        approved_by: Set(None),
        approved_at: Set(None),
        actual_return_date: Set(None),
        notes: Set(None),
        created_at: Set(now),
        ..Default::default()
    };

    request.insert(db).await.map_err(Into::into)
}

/// Finds a borrow request by ID.
pub async fn get_request_by_id(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<Option<borrow_request::Model>> {
    BorrowRequest::find_by_id(request_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_request(db: &DatabaseConnection, request_id: i64) -> Result<borrow_request::Model> {
    get_request_by_id(db, request_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Borrow request",
            id: request_id,
        })
}

/// Moves `snapshot` to `next` along with `changes`, only if the stored status still
/// matches the snapshot.
pub(crate) async fn commit_transition(
    db: &DatabaseConnection,
    snapshot: &borrow_request::Model,
    next: BorrowStatus,
    mut changes: borrow_request::ActiveModel,
) -> Result<borrow_request::Model> {
    ensure_transition(snapshot.status, next)?;
    changes.status = Set(next);

    let result = BorrowRequest::update_many()
        .set(changes)
        .filter(borrow_request::Column::Id.eq(snapshot.id))
        .filter(borrow_request::Column::Status.eq(snapshot.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ConcurrentModification {
            entity: "Borrow request",
            id: snapshot.id,
        });
    }

    find_request(db, snapshot.id).await
}

async fn transition(
    db: &DatabaseConnection,
    request_id: i64,
    next: BorrowStatus,
    changes: borrow_request::ActiveModel,
) -> Result<borrow_request::Model> {
    let snapshot = find_request(db, request_id).await?;
    commit_transition(db, &snapshot, next, changes).await
}

/// Approves a pending request.
#[instrument(skip(db))]
pub async fn approve_request(
    db: &DatabaseConnection,
    request_id: i64,
    approver_id: &str,
    now: DateTime<Utc>,
) -> Result<borrow_request::Model> {
    let changes = borrow_request::ActiveModel {
        approved_by: Set(Some(approver_id.to_string())),
        approved_at: Set(Some(now)),
        ..Default::default()
    };
    let approved = transition(db, request_id, BorrowStatus::Approved, changes).await?;

    info!(request_id, approver = approver_id, "Borrow request approved");
    Ok(approved)
}

/// Rejects a pending request, keeping the reason in `notes`.
///
/// `approved_by` and `approved_at` record who decided and when, whichever way it went.
#[instrument(skip(db))]
pub async fn reject_request(
    db: &DatabaseConnection,
    request_id: i64,
    approver_id: &str,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<borrow_request::Model> {
    let changes = borrow_request::ActiveModel {
        approved_by: Set(Some(approver_id.to_string())),
        approved_at: Set(Some(now)),
        notes: Set(reason),
        ..Default::default()
    };
    let rejected = transition(db, request_id, BorrowStatus::Rejected, changes).await?;

    info!(request_id, approver = approver_id, "Borrow request rejected");
    Ok(rejected)
}

/// Records that the asset was handed over.
pub async fn mark_borrowed(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<borrow_request::Model> {
    transition(
        db,
        request_id,
        BorrowStatus::Borrowed,
        <borrow_request::ActiveModel as Default>::default(),
    )
    .await
}

/// Records that the asset came back at `now`.
#[instrument(skip(db))]
pub async fn mark_returned(
    db: &DatabaseConnection,
    request_id: i64,
    now: DateTime<Utc>,
) -> Result<borrow_request::Model> {
    let changes = borrow_request::ActiveModel {
        actual_return_date: Set(Some(now)),
        ..Default::default()
    };
    transition(db, request_id, BorrowStatus::Returned, changes).await
}

/// Lists requests newest first, optionally only those in `status`.
pub async fn list_requests(
    db: &DatabaseConnection,
    status: Option<BorrowStatus>,
) -> Result<Vec<borrow_request::Model>> {
    let mut query = BorrowRequest::find();
    if let Some(status) = status {
        query = query.filter(borrow_request::Column::Status.eq(status));
    }

    query
        .order_by_desc(borrow_request::Column::CreatedAt)
        .order_by_desc(borrow_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loans past their expected return date, oldest due first.
pub async fn overdue_requests(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<borrow_request::Model>> {
    let outstanding = BorrowRequest::find()
        .filter(
            borrow_request::Column::Status.is_in([BorrowStatus::Approved, BorrowStatus::Borrowed]),
        )
        .filter(borrow_request::Column::ExpectedReturnDate.lt(now))
        .order_by_asc(borrow_request::Column::ExpectedReturnDate)
        .all(db)
        .await?;

    Ok(outstanding)
}
