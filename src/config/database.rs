//! Database configuration module for `itdesk`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    Asset, BorrowRequest, BudgetCategory, BudgetExpense, ConsumableModel, Contract,
    MaintenanceSchedule, SoftwareLicense, StockTransaction, Ticket,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/itdesk.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory that must exist before a file-backed `SQLite` URL can be opened.
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set. The file's
/// directory is created when missing.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&url) {
        std::fs::create_dir_all(dir)?;
    }
    Database::connect(url).await.map_err(Into::into)
}

async fn create_table_for<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables from the entity definitions, skipping any that already exist.
///
/// Parent tables are created before the tables that reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, Asset).await?;
    create_table_for(db, &schema, ConsumableModel).await?;
    create_table_for(db, &schema, StockTransaction).await?;
    create_table_for(db, &schema, MaintenanceSchedule).await?;
    create_table_for(db, &schema, BudgetCategory).await?;
    create_table_for(db, &schema, BudgetExpense).await?;
    create_table_for(db, &schema, SoftwareLicense).await?;
    create_table_for(db, &schema, Contract).await?;
    create_table_for(db, &schema, Ticket).await?;
    create_table_for(db, &schema, BorrowRequest).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        Asset::find().limit(1).all(&db).await?;
        ConsumableModel::find().limit(1).all(&db).await?;
        StockTransaction::find().limit(1).all(&db).await?;
        MaintenanceSchedule::find().limit(1).all(&db).await?;
        BudgetCategory::find().limit(1).all(&db).await?;
        BudgetExpense::find().limit(1).all(&db).await?;
        SoftwareLicense::find().limit(1).all(&db).await?;
        Contract::find().limit(1).all(&db).await?;
        Ticket::find().limit(1).all(&db).await?;
        BorrowRequest::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir(DEFAULT_DATABASE_URL),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite://itdesk.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
