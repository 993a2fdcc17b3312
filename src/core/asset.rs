//! Asset inventory business logic - Registration, assignment and lifecycle status.
//!
//! Status changes follow the asset workflow table. A status write only lands if the row
//! still holds the status it was checked against; otherwise the caller gets
//! [`Error::ConcurrentModification`].

use crate::{
    core::workflow::ensure_transition,
    entities::{
        Asset, AssetCondition, AssetStatus, BorrowRequest, MaintenanceSchedule, asset,
        borrow_request, maintenance_schedule,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Attributes for registering an asset.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub asset_code: String,
    pub name: String,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub condition: AssetCondition,
}

/// Editable attributes; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub serial_number: Option<Option<String>>,
    pub model: Option<Option<String>>,
    pub manufacturer: Option<Option<String>>,
    pub condition: Option<AssetCondition>,
}

/// Registers an available, unassigned asset.
#[instrument(skip(db))]
pub async fn create_asset(
    db: &DatabaseConnection,
    new: NewAsset,
    now: DateTime<Utc>,
) -> Result<asset::Model> {
    let asset_code = new.asset_code.trim().to_string();
    let name = new.name.trim().to_string();

    if asset_code.is_empty() {
        return Err(Error::validation("Asset code cannot be empty"));
    }
    if name.is_empty() {
        return Err(Error::validation("Asset name cannot be empty"));
    }
    if get_asset_by_code(db, &asset_code).await?.is_some() {
        return Err(Error::validation(format!(
            "Asset {asset_code} already exists"
        )));
    }

    let asset = asset::ActiveModel {
        asset_code: Set(asset_code),
        name: Set(name),
        serial_number: Set(new.serial_number),
        model: Set(new.model),
        manufacturer: Set(new.manufacturer),
        status: Set(AssetStatus::Available),
        condition: Set(new.condition),
        assigned_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = asset.insert(db).await?;
    info!(asset_id = created.id, asset_code = %created.asset_code, "Asset registered");
    Ok(created)
}

/// Finds an asset by ID.
pub async fn get_asset_by_id(
    db: &DatabaseConnection,
    asset_id: i64,
) -> Result<Option<asset::Model>> {
    Asset::find_by_id(asset_id).one(db).await.map_err(Into::into)
}

/// Finds an asset by its inventory code.
pub async fn get_asset_by_code(
    db: &DatabaseConnection,
    asset_code: &str,
) -> Result<Option<asset::Model>> {
    Asset::find()
        .filter(asset::Column::AssetCode.eq(asset_code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an asset or fails with [`Error::NotFound`].
pub(crate) async fn find_asset(db: &DatabaseConnection, asset_id: i64) -> Result<asset::Model> {
    get_asset_by_id(db, asset_id).await?.ok_or(Error::NotFound {
        entity: "Asset",
        id: asset_id,
    })
}

/// Lists assets ordered by code, optionally only those in `status`.
pub async fn list_assets(
    db: &DatabaseConnection,
    status: Option<AssetStatus>,
) -> Result<Vec<asset::Model>> {
    let mut query = Asset::find();
    if let Some(status) = status {
        query = query.filter(asset::Column::Status.eq(status));
    }

    query
        .order_by_asc(asset::Column::AssetCode)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Edits descriptive attributes. Status and assignment have their own operations.
#[instrument(skip(db))]
pub async fn update_asset(
    db: &DatabaseConnection,
    asset_id: i64,
    update: AssetUpdate,
    now: DateTime<Utc>,
) -> Result<asset::Model> {
    let asset = find_asset(db, asset_id).await?;
    let mut active: asset::ActiveModel = asset.into();

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Asset name cannot be empty"));
        }
        active.name = Set(name);
    }
    if let Some(serial_number) = update.serial_number {
        active.serial_number = Set(serial_number);
    }
    if let Some(model) = update.model {
        active.model = Set(model);
    }
    if let Some(manufacturer) = update.manufacturer {
        active.manufacturer = Set(manufacturer);
    }
    if let Some(condition) = update.condition {
        active.condition = Set(condition);
    }
    active.updated_at = Set(now);

    active.update(db).await.map_err(Into::into)
}

/// Writes `next` only if the row still has the snapshot's status.
pub(crate) async fn commit_transition(
    db: &DatabaseConnection,
    snapshot: &asset::Model,
    next: AssetStatus,
    assigned_to: Option<String>,
    now: DateTime<Utc>,
) -> Result<asset::Model> {
    ensure_transition(snapshot.status, next)?;

    let result = Asset::update_many()
        .col_expr(asset::Column::Status, Expr::value(next))
        .col_expr(asset::Column::AssignedTo, Expr::value(assigned_to))
        .col_expr(asset::Column::UpdatedAt, Expr::value(now))
        .filter(asset::Column::Id.eq(snapshot.id))
        .filter(asset::Column::Status.eq(snapshot.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ConcurrentModification {
            entity: "Asset",
            id: snapshot.id,
        });
    }

    info!(asset_id = snapshot.id, from = ?snapshot.status, to = ?next, "Asset status changed");
    find_asset(db, snapshot.id).await
}

/// Moves an asset to `status` and clears its assignment.
///
/// # Errors
/// * [`Error::Validation`] for `in_use`, which needs a user; use [`assign_asset`]
/// * [`Error::InvalidTransition`] if the asset workflow has no such edge
#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    asset_id: i64,
    status: AssetStatus,
    now: DateTime<Utc>,
) -> Result<asset::Model> {
    if status == AssetStatus::InUse {
        return Err(Error::validation(
            "Assets are put in use by assigning them to a user",
        ));
    }

    let asset = find_asset(db, asset_id).await?;
    commit_transition(db, &asset, status, None, now).await
}

/// Assigns an asset to a user and marks it `in_use`.
#[instrument(skip(db))]
pub async fn assign_asset(
    db: &DatabaseConnection,
    asset_id: i64,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<asset::Model> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::validation("Assignee cannot be empty"));
    }

    let asset = find_asset(db, asset_id).await?;
    commit_transition(db, &asset, AssetStatus::InUse, Some(user_id.to_string()), now).await
}

/// Deletes an asset that no schedule or borrow request refers to.
///
/// # Errors
/// Returns [`Error::Validation`] if the asset is still referenced; retire it instead.
#[instrument(skip(db))]
pub async fn delete_asset(db: &DatabaseConnection, asset_id: i64) -> Result<()> {
    let asset = find_asset(db, asset_id).await?;

    let schedules = MaintenanceSchedule::find()
        .filter(maintenance_schedule::Column::AssetId.eq(asset_id))
        .count(db)
        .await?;
    let requests = BorrowRequest::find()
        .filter(borrow_request::Column::AssetId.eq(asset_id))
        .count(db)
        .await?;

    if schedules + requests > 0 {
        return Err(Error::validation(format!(
            "Asset {} is referenced by {schedules} schedules and {requests} borrow requests; retire it instead",
            asset.asset_code
        )));
    }

    asset.delete(db).await?;
    Ok(())
}
