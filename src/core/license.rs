//! Software license business logic - Seat pools and expiry.
//!
//! Seat counts change through single conditional updates
//! (`used = used + 1 WHERE used < total`), so two concurrent assignments can never
//! hand out more seats than were bought.

use crate::{
    core::expiry::{ExpiryStatus, classify_expiry},
    entities::{SoftwareLicense, software_license},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Attributes for registering a license pool.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub license_number: String,
    pub software_name: String,
    pub vendor: Option<String>,
    pub total_licenses: i32,
    pub purchase_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub cost: f64,
}

/// Seats still free to assign.
#[must_use]
pub const fn available_seats(license: &software_license::Model) -> i32 {
    license.total_licenses - license.used_licenses
}

/// Expiry label for a license; `Perpetual` when it has no expiry date.
#[must_use]
pub fn expiry_status(
    license: &software_license::Model,
    now: DateTime<Utc>,
    window: Duration,
) -> ExpiryStatus {
    classify_expiry(license.expiry_date, now, window)
}

/// Registers a license pool with no seats assigned.
#[instrument(skip(db))]
pub async fn create_license(
    db: &DatabaseConnection,
    new: NewLicense,
) -> Result<software_license::Model> {
    if new.license_number.trim().is_empty() {
        return Err(Error::validation("License number cannot be empty"));
    }
    if new.software_name.trim().is_empty() {
        return Err(Error::validation("Software name cannot be empty"));
    }
    if new.total_licenses <= 0 {
        return Err(Error::validation(format!(
            "A license needs at least one seat, got {}",
            new.total_licenses
        )));
    }
    if !new.cost.is_finite() || new.cost < 0.0 {
        return Err(Error::validation(format!("Invalid cost {}", new.cost)));
    }
    if let (Some(purchased), Some(expires)) = (new.purchase_date, new.expiry_date) {
        if expires < purchased {
            return Err(Error::validation("Expiry date is before the purchase date"));
        }
    }

    let license = software_license::ActiveModel {
        license_number: Set(new.license_number.trim().to_string()),
        software_name: Set(new.software_name.trim().to_string()),
        vendor: Set(new.vendor),
        total_licenses: Set(new.total_licenses),
        used_licenses: Set(0),
        purchase_date: Set(new.purchase_date),
        expiry_date: Set(new.expiry_date),
        cost: Set(new.cost),
        is_active: Set(true),
        ..Default::default()
    };

    license.insert(db).await.map_err(Into::into)
}

/// Finds a license by ID.
pub async fn get_license_by_id(
    db: &DatabaseConnection,
    license_id: i64,
) -> Result<Option<software_license::Model>> {
    SoftwareLicense::find_by_id(license_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_license(
    db: &DatabaseConnection,
    license_id: i64,
) -> Result<software_license::Model> {
    get_license_by_id(db, license_id).await?.ok_or(Error::NotFound {
        entity: "License",
        id: license_id,
    })
}

/// Lists all licenses ordered by software name.
pub async fn list_licenses(db: &DatabaseConnection) -> Result<Vec<software_license::Model>> {
    SoftwareLicense::find()
        .order_by_asc(software_license::Column::SoftwareName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Assigns one seat from an active license.
///
/// # Errors
/// * [`Error::LicenseFull`] if every seat is already assigned
/// * [`Error::Validation`] if the license is inactive
#[instrument(skip(db))]
pub async fn assign_seat(
    db: &DatabaseConnection,
    license_id: i64,
) -> Result<software_license::Model> {
    let result = SoftwareLicense::update_many()
        .col_expr(
            software_license::Column::UsedLicenses,
            Expr::col(software_license::Column::UsedLicenses).add(1),
        )
        .filter(software_license::Column::Id.eq(license_id))
        .filter(software_license::Column::IsActive.eq(true))
        .filter(
            Expr::col(software_license::Column::UsedLicenses)
                .lt(Expr::col(software_license::Column::TotalLicenses)),
        )
        .exec(db)
        .await?;

    let license = find_license(db, license_id).await?;

    if result.rows_affected == 0 {
        if !license.is_active {
            return Err(Error::validation(format!(
                "License {} is inactive",
                license.license_number
            )));
        }
        return Err(Error::LicenseFull {
            total: license.total_licenses,
        });
    }

    info!(
        license_id,
        used = license.used_licenses,
        total = license.total_licenses,
        "License seat assigned"
    );
    Ok(license)
}

/// Releases one assigned seat.
///
/// # Errors
/// Returns [`Error::Validation`] if no seat is assigned.
#[instrument(skip(db))]
pub async fn unassign_seat(
    db: &DatabaseConnection,
    license_id: i64,
) -> Result<software_license::Model> {
    let result = SoftwareLicense::update_many()
        .col_expr(
            software_license::Column::UsedLicenses,
            Expr::col(software_license::Column::UsedLicenses).sub(1),
        )
        .filter(software_license::Column::Id.eq(license_id))
        .filter(software_license::Column::UsedLicenses.gt(0))
        .exec(db)
        .await?;

    let license = find_license(db, license_id).await?;

    if result.rows_affected == 0 {
        return Err(Error::validation(format!(
            "License {} has no assigned seats",
            license.license_number
        )));
    }

    Ok(license)
}

/// Active licenses that expire within `window` of `now`, soonest first.
pub async fn expiring_licenses(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<Vec<software_license::Model>> {
    let licenses = SoftwareLicense::find()
        .filter(software_license::Column::IsActive.eq(true))
        .filter(software_license::Column::ExpiryDate.is_not_null())
        .order_by_asc(software_license::Column::ExpiryDate)
        .all(db)
        .await?;

    Ok(licenses
        .into_iter()
        .filter(|license| expiry_status(license, now, window) == ExpiryStatus::ExpiringSoon)
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn new_license(number: &str, total: i32, expiry: Option<DateTime<Utc>>) -> NewLicense {
        NewLicense {
            license_number: number.to_string(),
            software_name: format!("Office suite {number}"),
            vendor: Some("Contoso".to_string()),
            total_licenses: total,
            purchase_date: None,
            expiry_date: expiry,
            cost: 12_000.0,
        }
    }

    #[tokio::test]
    async fn test_create_license_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_license(&db, new_license("L-1", 0, None)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_license(&db, new_license("", 5, None)).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut backwards = new_license("L-2", 5, Some(now()));
        backwards.purchase_date = Some(now() + Duration::days(1));
        let result = create_license(&db, backwards).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_assign_until_full() -> Result<()> {
        let db = setup_test_db().await?;
        let license = create_license(&db, new_license("L-1", 2, None)).await?;

        let after_one = assign_seat(&db, license.id).await?;
        assert_eq!(after_one.used_licenses, 1);
        assert_eq!(available_seats(&after_one), 1);

        assign_seat(&db, license.id).await?;
        let result = assign_seat(&db, license.id).await;
        assert!(matches!(result, Err(Error::LicenseFull { total: 2 })));

        let stored = get_license_by_id(&db, license.id).await?.unwrap();
        assert_eq!(stored.used_licenses, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_unassign_never_goes_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let license = create_license(&db, new_license("L-1", 3, None)).await?;

        let result = unassign_seat(&db, license.id).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        assign_seat(&db, license.id).await?;
        let released = unassign_seat(&db, license.id).await?;
        assert_eq!(released.used_licenses, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_assign_missing_license() -> Result<()> {
        let db = setup_test_db().await?;
        let result = assign_seat(&db, 77).await;
        assert!(matches!(result, Err(Error::NotFound { id: 77, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_expiring_licenses() -> Result<()> {
        let db = setup_test_db().await?;
        create_license(&db, new_license("PERPETUAL", 1, None)).await?;
        create_license(&db, new_license("EXPIRED", 1, Some(now() - Duration::days(1)))).await?;
        let soon =
            create_license(&db, new_license("SOON", 1, Some(now() + Duration::days(10)))).await?;
        create_license(&db, new_license("LATER", 1, Some(now() + Duration::days(90)))).await?;

        let expiring = expiring_licenses(&db, now(), Duration::days(30)).await?;
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].id, soon.id);
        assert_eq!(
            expiry_status(&expiring[0], now(), Duration::days(30)),
            ExpiryStatus::ExpiringSoon
        );

        Ok(())
    }
}
