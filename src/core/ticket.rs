//! Helpdesk ticket business logic
//!
//! Tickets are numbered `TK-YYYYMMDD-NNNN` with a per-day sequence. Every status change
//! is checked against the ticket workflow table and written only while the stored status
//! is still the one that was checked.

use crate::{
    core::workflow::ensure_transition,
    entities::{Ticket, TicketStatus, ticket},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Attributes for raising a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub requester_id: String,
}

/// Prefix shared by every ticket raised on the day of `now`.
fn number_prefix(now: DateTime<Utc>) -> String {
    format!("TK-{}-", now.format("%Y%m%d"))
}

/// Sequence number that follows `last`, the highest number issued under `prefix`.
fn next_sequence(prefix: &str, last: Option<&str>) -> Result<u32> {
    let Some(last) = last else {
        return Ok(1);
    };

    last.strip_prefix(prefix)
        .and_then(|suffix| suffix.parse::<u32>().ok())
        .map(|sequence| sequence + 1)
        .ok_or_else(|| Error::validation(format!("Malformed ticket number {last}")))
}

/// Raises a new open ticket and assigns the next number for the day.
///
/// The number continues from the highest one issued that day, so deleted tickets never
/// free up a number for reuse.
#[instrument(skip(db, new), fields(requester = %new.requester_id))]
pub async fn create_ticket(
    db: &DatabaseConnection,
    new: NewTicket,
    now: DateTime<Utc>,
) -> Result<ticket::Model> {
    if new.title.trim().is_empty() {
        return Err(Error::validation("Ticket title cannot be empty"));
    }
    if new.requester_id.trim().is_empty() {
        return Err(Error::validation("Requester cannot be empty"));
    }

    let prefix = number_prefix(now);
    let last = Ticket::find()
        .filter(ticket::Column::TicketNumber.starts_with(&prefix))
        .order_by_desc(ticket::Column::TicketNumber)
        .one(db)
        .await?;
    let sequence = next_sequence(&prefix, last.as_ref().map(|t| t.ticket_number.as_str()))?;
    let ticket_number = format!("{prefix}{sequence:04}");

    let ticket = ticket::ActiveModel {
        ticket_number: Set(ticket_number),
        title: Set(new.title.trim().to_string()),
        description: Set(new.description),
        status: Set(TicketStatus::Open),
        requester_id: Set(new.requester_id),
        assigned_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let ticket = ticket.insert(db).await?;
    info!(ticket_number = %ticket.ticket_number, "Ticket raised");
    Ok(ticket)
}

/// Finds a ticket by ID.
pub async fn get_ticket_by_id(
    db: &DatabaseConnection,
    ticket_id: i64,
) -> Result<Option<ticket::Model>> {
    Ticket::find_by_id(ticket_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_ticket(db: &DatabaseConnection, ticket_id: i64) -> Result<ticket::Model> {
    get_ticket_by_id(db, ticket_id).await?.ok_or(Error::NotFound {
        entity: "Ticket",
        id: ticket_id,
    })
}

/// Lists tickets newest first, optionally only those in `status`.
pub async fn list_tickets(
    db: &DatabaseConnection,
    status: Option<TicketStatus>,
) -> Result<Vec<ticket::Model>> {
    let mut query = Ticket::find();
    if let Some(status) = status {
        query = query.filter(ticket::Column::Status.eq(status));
    }

    query
        .order_by_desc(ticket::Column::CreatedAt)
        .order_by_desc(ticket::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Writes `next` and `changes` only if the ticket still has the snapshot's status.
pub(crate) async fn commit_transition(
    db: &DatabaseConnection,
    snapshot: &ticket::Model,
    next: TicketStatus,
    mut changes: ticket::ActiveModel,
) -> Result<ticket::Model> {
    ensure_transition(snapshot.status, next)?;
    changes.status = Set(next);

    let result = Ticket::update_many()
        .set(changes)
        .filter(ticket::Column::Id.eq(snapshot.id))
        .filter(ticket::Column::Status.eq(snapshot.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ConcurrentModification {
            entity: "Ticket",
            id: snapshot.id,
        });
    }

    info!(ticket_id = snapshot.id, from = ?snapshot.status, to = ?next, "Ticket status changed");
    find_ticket(db, snapshot.id).await
}

/// Moves a ticket to `status`.
///
/// # Errors
/// * [`Error::InvalidTransition`] if the ticket workflow has no such edge
/// * [`Error::ConcurrentModification`] if the status changed after it was read
#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    ticket_id: i64,
    status: TicketStatus,
    now: DateTime<Utc>,
) -> Result<ticket::Model> {
    let ticket = find_ticket(db, ticket_id).await?;
    let changes = ticket::ActiveModel {
        updated_at: Set(now),
        ..Default::default()
    };
    commit_transition(db, &ticket, status, changes).await
}

/// Assigns a ticket to a technician, moving it to `Assigned`.
#[instrument(skip(db))]
pub async fn assign_ticket(
    db: &DatabaseConnection,
    ticket_id: i64,
    technician_id: &str,
    now: DateTime<Utc>,
) -> Result<ticket::Model> {
    if technician_id.trim().is_empty() {
        return Err(Error::validation("Technician cannot be empty"));
    }

    let ticket = find_ticket(db, ticket_id).await?;
    let changes = ticket::ActiveModel {
        assigned_to: Set(Some(technician_id.to_string())),
        updated_at: Set(now),
        ..Default::default()
    };
    commit_transition(db, &ticket, TicketStatus::Assigned, changes).await
}

/// Deletes a ticket.
pub async fn delete_ticket(db: &DatabaseConnection, ticket_id: i64) -> Result<()> {
    let result = Ticket::delete_by_id(ticket_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Ticket",
            id: ticket_id,
        });
    }
    Ok(())
}
