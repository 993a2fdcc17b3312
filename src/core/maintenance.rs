//! Preventive maintenance business logic
//!
//! Handles PM schedules and their due status. The due status ([`DueStatus`]) is derived
//! from `is_active` and `next_due_date` against the caller's `now` and is never stored.
//! The workflow status (`PmStatus`) is stored and changes only along the edges in
//! [`crate::core::workflow`].
//!
//! Completing a run stamps `last_completed_date` but leaves `next_due_date` alone: the
//! next cycle is set explicitly with [`reschedule`].

use crate::{
    core::{asset, workflow::ensure_transition},
    entities::{MaintenanceSchedule, PmStatus, maintenance_schedule},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// Days ahead of `next_due_date` at which a schedule counts as due soon
pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;

/// Point-in-time due label for a PM schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    /// Active and not due within the window
    Normal,
    /// Active and due within the window
    DueSoon,
    /// Active and past its due date
    Overdue,
    /// Schedule switched off; takes precedence over everything else
    Inactive,
}

/// Attributes for a new PM schedule.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub asset_id: i64,
    pub name: String,
    pub frequency_days: i32,
    pub next_due_date: DateTime<Utc>,
}

/// Classifies a schedule with the default 7-day look-ahead.
#[must_use]
pub fn classify(schedule: &maintenance_schedule::Model, now: DateTime<Utc>) -> DueStatus {
    classify_with_window(schedule, now, Duration::days(DEFAULT_DUE_SOON_DAYS))
}

/// Classifies a schedule: inactive first, then overdue, then due soon.
#[must_use]
pub fn classify_with_window(
    schedule: &maintenance_schedule::Model,
    now: DateTime<Utc>,
    window: Duration,
) -> DueStatus {
    if !schedule.is_active {
        DueStatus::Inactive
    } else if schedule.next_due_date < now {
        DueStatus::Overdue
    } else if schedule.next_due_date - now <= window {
        DueStatus::DueSoon
    } else {
        DueStatus::Normal
    }
}

async fn find_schedule(
    db: &DatabaseConnection,
    schedule_id: i64,
) -> Result<maintenance_schedule::Model> {
    get_schedule_by_id(db, schedule_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "Maintenance schedule",
            id: schedule_id,
        })
}

/// Creates an active schedule in the `scheduled` state.
///
/// # Errors
/// * [`Error::Validation`] for an empty name or a non-positive frequency
/// * [`Error::NotFound`] if the asset does not exist
#[instrument(skip(db))]
pub async fn create_schedule(
    db: &DatabaseConnection,
    new: NewSchedule,
) -> Result<maintenance_schedule::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::validation("Schedule name cannot be empty"));
    }
    if new.frequency_days <= 0 {
        return Err(Error::validation(format!(
            "Frequency must be at least one day, got {}",
            new.frequency_days
        )));
    }
    asset::find_asset(db, new.asset_id).await?;

    let schedule = maintenance_schedule::ActiveModel {
        asset_id: Set(new.asset_id),
        name: Set(new.name.trim().to_string()),
        frequency_days: Set(new.frequency_days),
        next_due_date: Set(new.next_due_date),
        last_completed_date: Set(None),
        is_active: Set(true),
        status: Set(PmStatus::Scheduled),
        performed_by: Set(None),
        notes: Set(None),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    schedule.insert(db).await.map_err(Into::into)
}

/// Finds a schedule by ID.
pub async fn get_schedule_by_id(
    db: &DatabaseConnection,
    schedule_id: i64,
) -> Result<Option<maintenance_schedule::Model>> {
    MaintenanceSchedule::find_by_id(schedule_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every schedule with its due status, soonest due first.
pub async fn list_schedules_with_status(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<Vec<(maintenance_schedule::Model, DueStatus)>> {
    let schedules = MaintenanceSchedule::find()
        .order_by_asc(maintenance_schedule::Column::NextDueDate)
        .all(db)
        .await?;

    Ok(schedules
        .into_iter()
        .map(|schedule| {
            let status = classify_with_window(&schedule, now, window);
            (schedule, status)
        })
        .collect())
}

/// Moves a schedule to another workflow status.
///
/// Moving to `completed` also stamps `last_completed_date`; prefer [`complete_pm`] when
/// the technician and notes are known.
///
/// # Errors
/// * [`Error::Validation`] for `scheduled`, which needs a due date; use [`reschedule`]
/// * [`Error::InvalidTransition`] if the PM workflow has no such edge
#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    schedule_id: i64,
    status: PmStatus,
    now: DateTime<Utc>,
) -> Result<maintenance_schedule::Model> {
    if status == PmStatus::Scheduled {
        return Err(Error::validation(
            "Schedules return to scheduled through reschedule with a new due date",
        ));
    }

    let schedule = find_schedule(db, schedule_id).await?;
    ensure_transition(schedule.status, status)?;

    let mut active: maintenance_schedule::ActiveModel = schedule.into();
    active.status = Set(status);
    active.updated_at = Set(now);
    if status == PmStatus::Completed {
        active.last_completed_date = Set(Some(now));
    }

    active.update(db).await.map_err(Into::into)
}

/// Records a completed maintenance run.
///
/// Sets `last_completed_date = now` and the `completed` status and keeps who did the work.
/// `next_due_date` is left unchanged.
#[instrument(skip(db, notes))]
pub async fn complete_pm(
    db: &DatabaseConnection,
    schedule_id: i64,
    performed_by: &str,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<maintenance_schedule::Model> {
    if performed_by.trim().is_empty() {
        return Err(Error::validation("Performed-by is required to complete a PM"));
    }

    let schedule = find_schedule(db, schedule_id).await?;
    ensure_transition(schedule.status, PmStatus::Completed)?;

    let mut active: maintenance_schedule::ActiveModel = schedule.into();
    active.status = Set(PmStatus::Completed);
    active.last_completed_date = Set(Some(now));
    active.performed_by = Set(Some(performed_by.trim().to_string()));
    active.notes = Set(notes);
    active.updated_at = Set(now);

    let updated = active.update(db).await?;
    info!(schedule_id, performed_by, "PM completed");
    Ok(updated)
}

/// Sets the next due date and puts the schedule back in the `scheduled` state.
#[instrument(skip(db))]
pub async fn reschedule(
    db: &DatabaseConnection,
    schedule_id: i64,
    next_due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<maintenance_schedule::Model> {
    let schedule = find_schedule(db, schedule_id).await?;
    if schedule.status != PmStatus::Scheduled {
        ensure_transition(schedule.status, PmStatus::Scheduled)?;
    }

    let mut active: maintenance_schedule::ActiveModel = schedule.into();
    active.status = Set(PmStatus::Scheduled);
    active.next_due_date = Set(next_due_date);
    active.updated_at = Set(now);

    active.update(db).await.map_err(Into::into)
}

/// Switches a schedule on or off. Inactive schedules are never reported as due.
pub async fn set_active(
    db: &DatabaseConnection,
    schedule_id: i64,
    is_active: bool,
) -> Result<maintenance_schedule::Model> {
    let schedule = find_schedule(db, schedule_id).await?;
    let mut active: maintenance_schedule::ActiveModel = schedule.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Deletes a schedule.
pub async fn delete_schedule(db: &DatabaseConnection, schedule_id: i64) -> Result<()> {
    let schedule = find_schedule(db, schedule_id).await?;
    schedule.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};

    async fn setup_with_asset() -> Result<(DatabaseConnection, i64)> {
        let db = setup_test_db().await?;
        let asset = create_test_asset(&db, "PR-0010").await?;
        Ok((db, asset.id))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn schedule(next_due_date: DateTime<Utc>, is_active: bool) -> maintenance_schedule::Model {
        maintenance_schedule::Model {
            id: 1,
            asset_id: 10,
            name: "Printer cleaning".to_string(),
            frequency_days: 90,
            next_due_date,
            last_completed_date: None,
            is_active,
            status: PmStatus::Scheduled,
            performed_by: None,
            notes: None,
            updated_at: now(),
        }
    }

    fn new_schedule(asset_id: i64, next_due_date: DateTime<Utc>) -> NewSchedule {
        NewSchedule {
            asset_id,
            name: "Printer cleaning".to_string(),
            frequency_days: 90,
            next_due_date,
        }
    }

    #[test]
    fn test_classify_overdue_yesterday() {
        let yesterday = now() - Duration::days(1);
        assert_eq!(classify(&schedule(yesterday, true), now()), DueStatus::Overdue);
    }

    #[test]
    fn test_classify_inactive_takes_precedence() {
        let yesterday = now() - Duration::days(1);
        assert_eq!(classify(&schedule(yesterday, false), now()), DueStatus::Inactive);
    }

    #[test]
    fn test_classify_due_soon_boundaries() {
        assert_eq!(classify(&schedule(now(), true), now()), DueStatus::DueSoon);
        assert_eq!(
            classify(&schedule(now() + Duration::days(7), true), now()),
            DueStatus::DueSoon
        );
        assert_eq!(
            classify(&schedule(now() + Duration::days(8), true), now()),
            DueStatus::Normal
        );
    }

    #[test]
    fn test_classify_custom_window() {
        let in_ten_days = schedule(now() + Duration::days(10), true);
        assert_eq!(
            classify_with_window(&in_ten_days, now(), Duration::days(14)),
            DueStatus::DueSoon
        );
    }

    #[tokio::test]
    async fn test_create_schedule_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut bad = new_schedule(10, now());
        bad.frequency_days = 0;
        assert!(matches!(
            create_schedule(&db, bad).await,
            Err(Error::Validation { .. })
        ));

        let mut unnamed = new_schedule(10, now());
        unnamed.name = " ".to_string();
        assert!(matches!(
            create_schedule(&db, unnamed).await,
            Err(Error::Validation { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_pm_keeps_next_due_date() -> Result<()> {
        let (db, asset_id) = setup_with_asset().await?;
        let due = now() + Duration::days(3);
        let created = create_schedule(&db, new_schedule(asset_id, due)).await?;

        let done = complete_pm(
            &db,
            created.id,
            "tech1",
            Some("Replaced rollers".to_string()),
            now(),
        )
        .await?;

        assert_eq!(done.status, PmStatus::Completed);
        assert_eq!(done.last_completed_date, Some(now()));
        assert_eq!(done.next_due_date, due);
        assert_eq!(done.performed_by.as_deref(), Some("tech1"));
        assert_eq!(done.notes.as_deref(), Some("Replaced rollers"));

        // Completing twice is not a transition
        let again = complete_pm(&db, created.id, "tech1", None, now()).await;
        assert!(matches!(again, Err(Error::InvalidTransition { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_reschedule_starts_next_cycle() -> Result<()> {
        let (db, asset_id) = setup_with_asset().await?;
        let created =
            create_schedule(&db, new_schedule(asset_id, now() - Duration::days(2))).await?;
        complete_pm(&db, created.id, "tech1", None, now()).await?;

        let next = now() + Duration::days(90);
        let rescheduled = reschedule(&db, created.id, next, now()).await?;
        assert_eq!(rescheduled.status, PmStatus::Scheduled);
        assert_eq!(rescheduled.next_due_date, next);
        assert_eq!(classify(&rescheduled, now()), DueStatus::Normal);

        // A schedule that is already scheduled can simply move its date
        let moved = reschedule(&db, created.id, now() + Duration::days(5), now()).await?;
        assert_eq!(classify(&moved, now()), DueStatus::DueSoon);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_follows_workflow() -> Result<()> {
        let (db, asset_id) = setup_with_asset().await?;
        let created = create_schedule(&db, new_schedule(asset_id, now())).await?;

        let started = update_status(&db, created.id, PmStatus::InProgress, now()).await?;
        assert_eq!(started.status, PmStatus::InProgress);
        assert_eq!(started.last_completed_date, None);

        let result = update_status(&db, created.id, PmStatus::InProgress, now()).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        let finished = update_status(&db, created.id, PmStatus::Completed, now()).await?;
        assert_eq!(finished.last_completed_date, Some(now()));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_cannot_reschedule() -> Result<()> {
        let (db, asset_id) = setup_with_asset().await?;
        let due = now() - Duration::days(1);
        let created = create_schedule(&db, new_schedule(asset_id, due)).await?;
        complete_pm(&db, created.id, "tech1", None, now()).await?;

        // completed -> scheduled exists in the workflow but needs a new due date
        let result = update_status(&db, created.id, PmStatus::Scheduled, now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let stored = get_schedule_by_id(&db, created.id).await?.unwrap();
        assert_eq!(stored.status, PmStatus::Completed);
        assert_eq!(stored.next_due_date, due);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_schedule_requires_asset() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_schedule(&db, new_schedule(404, now())).await;
        assert!(matches!(
            result,
            Err(Error::NotFound { entity: "Asset", id: 404 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_schedules_with_status() -> Result<()> {
        let (db, asset_id) = setup_with_asset().await?;
        let overdue =
            create_schedule(&db, new_schedule(asset_id, now() - Duration::days(1))).await?;
        let later =
            create_schedule(&db, new_schedule(asset_id, now() + Duration::days(30))).await?;
        let soon =
            create_schedule(&db, new_schedule(asset_id, now() + Duration::days(2))).await?;
        set_active(&db, later.id, false).await?;

        let listed = list_schedules_with_status(&db, now(), Duration::days(7)).await?;
        let statuses: Vec<(i64, DueStatus)> =
            listed.iter().map(|(s, status)| (s.id, *status)).collect();
        assert_eq!(
            statuses,
            vec![
                (overdue.id, DueStatus::Overdue),
                (soon.id, DueStatus::DueSoon),
                (later.id, DueStatus::Inactive),
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_schedule() -> Result<()> {
        let (db, asset_id) = setup_with_asset().await?;
        let created = create_schedule(&db, new_schedule(asset_id, now())).await?;

        delete_schedule(&db, created.id).await?;
        assert!(get_schedule_by_id(&db, created.id).await?.is_none());
        assert!(matches!(
            delete_schedule(&db, created.id).await,
            Err(Error::NotFound { .. })
        ));

        Ok(())
    }
}
