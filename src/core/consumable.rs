//! Consumable model business logic - Registration, edits and soft deactivation.
//!
//! Stock is never edited here; every stock change goes through [`crate::core::ledger`].
//! A model referenced by ledger entries cannot be hard-deleted, only deactivated.

use crate::{
    config::settings::ConsumableConfig,
    core::ledger,
    entities::{ConsumableModel, StockTransaction, consumable_model, stock_transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Attributes for registering a new consumable model.
#[derive(Debug, Clone)]
pub struct NewConsumable {
    pub model_number: String,
    pub name: String,
    pub color: Option<String>,
    pub consumable_type: String,
    pub unit_price: f64,
    pub min_stock_level: i64,
}

impl From<&ConsumableConfig> for NewConsumable {
    fn from(config: &ConsumableConfig) -> Self {
        Self {
            model_number: config.model_number.clone(),
            name: config.name.clone(),
            color: config.color.clone(),
            consumable_type: config.consumable_type.clone(),
            unit_price: config.unit_price,
            min_stock_level: config.min_stock_level,
        }
    }
}

/// Editable attributes; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConsumableUpdate {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub consumable_type: Option<String>,
    pub unit_price: Option<f64>,
    pub min_stock_level: Option<i64>,
}

fn validate_price(unit_price: f64) -> Result<()> {
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(Error::validation(format!("Invalid unit price {unit_price}")));
    }
    Ok(())
}

fn validate_min_stock(min_stock_level: i64) -> Result<()> {
    if min_stock_level < 0 {
        return Err(Error::validation("Minimum stock level cannot be negative"));
    }
    Ok(())
}

/// Registers a new consumable model with zero stock.
///
/// Validates that the model number and name are not empty, the price is a finite
/// non-negative number, and the threshold is non-negative. Model numbers are unique.
#[instrument(skip(db))]
pub async fn create_model(
    db: &DatabaseConnection,
    new: NewConsumable,
) -> Result<consumable_model::Model> {
    let model_number = new.model_number.trim().to_string();
    let name = new.name.trim().to_string();

    if model_number.is_empty() {
        return Err(Error::validation("Model number cannot be empty"));
    }
    if name.is_empty() {
        return Err(Error::validation("Model name cannot be empty"));
    }
    validate_price(new.unit_price)?;
    validate_min_stock(new.min_stock_level)?;

    if get_model_by_number(db, &model_number).await?.is_some() {
        return Err(Error::validation(format!(
            "Consumable model {model_number} already exists"
        )));
    }

    let model = consumable_model::ActiveModel {
        model_number: Set(model_number),
        name: Set(name),
        color: Set(new.color),
        consumable_type: Set(new.consumable_type),
        unit_price: Set(new.unit_price),
        min_stock_level: Set(new.min_stock_level),
        stock_quantity: Set(0),
        version: Set(0),
        is_active: Set(true),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(model_id = created.id, model_number = %created.model_number, "Consumable model registered");
    Ok(created)
}

/// Finds a model by its unique ID, active or not.
pub async fn get_model_by_id(
    db: &DatabaseConnection,
    model_id: i64,
) -> Result<Option<consumable_model::Model>> {
    ConsumableModel::find_by_id(model_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a model by its manufacturer model number, active or not.
pub async fn get_model_by_number(
    db: &DatabaseConnection,
    model_number: &str,
) -> Result<Option<consumable_model::Model>> {
    ConsumableModel::find()
        .filter(consumable_model::Column::ModelNumber.eq(model_number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active models, ordered alphabetically by name.
pub async fn get_all_active_models(
    db: &DatabaseConnection,
) -> Result<Vec<consumable_model::Model>> {
    ConsumableModel::find()
        .filter(consumable_model::Column::IsActive.eq(true))
        .order_by_asc(consumable_model::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active models at or below their minimum stock level.
///
/// Low-stock is recomputed from the rows just read, so it always reflects the latest
/// committed transaction.
pub async fn low_stock_models(db: &DatabaseConnection) -> Result<Vec<consumable_model::Model>> {
    let models = get_all_active_models(db).await?;
    Ok(models.into_iter().filter(ledger::is_low_stock).collect())
}

/// Edits descriptive attributes and the low-stock threshold.
#[instrument(skip(db))]
pub async fn update_model(
    db: &DatabaseConnection,
    model_id: i64,
    update: ConsumableUpdate,
) -> Result<consumable_model::Model> {
    let model = get_model_by_id(db, model_id).await?.ok_or(Error::NotFound {
        entity: "Consumable model",
        id: model_id,
    })?;

    let mut active: consumable_model::ActiveModel = model.into();

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Model name cannot be empty"));
        }
        active.name = Set(name);
    }
    if let Some(color) = update.color {
        active.color = Set(color);
    }
    if let Some(consumable_type) = update.consumable_type {
        active.consumable_type = Set(consumable_type);
    }
    if let Some(unit_price) = update.unit_price {
        validate_price(unit_price)?;
        active.unit_price = Set(unit_price);
    }
    if let Some(min_stock_level) = update.min_stock_level {
        validate_min_stock(min_stock_level)?;
        active.min_stock_level = Set(min_stock_level);
    }

    active.update(db).await.map_err(Into::into)
}

/// Deactivates or reactivates a model. Inactive models keep their ledger.
#[instrument(skip(db))]
pub async fn set_active(
    db: &DatabaseConnection,
    model_id: i64,
    is_active: bool,
) -> Result<consumable_model::Model> {
    let model = get_model_by_id(db, model_id).await?.ok_or(Error::NotFound {
        entity: "Consumable model",
        id: model_id,
    })?;

    let mut active: consumable_model::ActiveModel = model.into();
    active.is_active = Set(is_active);
    active.update(db).await.map_err(Into::into)
}

/// Hard-deletes a model that has never been transacted.
///
/// # Errors
/// Returns [`Error::Validation`] if any ledger entry references the model; deactivate it
/// with [`set_active`] instead.
#[instrument(skip(db))]
pub async fn delete_model(db: &DatabaseConnection, model_id: i64) -> Result<()> {
    let model = get_model_by_id(db, model_id).await?.ok_or(Error::NotFound {
        entity: "Consumable model",
        id: model_id,
    })?;

    let referenced = StockTransaction::find()
        .filter(stock_transaction::Column::ConsumableModelId.eq(model_id))
        .count(db)
        .await?;

    if referenced > 0 {
        return Err(Error::validation(format!(
            "Consumable model {} has {referenced} ledger entries; deactivate it instead",
            model.model_number
        )));
    }

    model.delete(db).await?;
    Ok(())
}

/// Registers every configured model that does not exist yet.
///
/// Existing models are matched by model number and left untouched.
/// Returns the number of models created.
pub async fn seed_models(db: &DatabaseConnection, configs: &[ConsumableConfig]) -> Result<usize> {
    let mut created = 0;
    for config in configs {
        if get_model_by_number(db, config.model_number.trim())
            .await?
            .is_none()
        {
            create_model(db, NewConsumable::from(config)).await?;
            created += 1;
        }
    }
    Ok(created)
}
