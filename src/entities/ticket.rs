//! Ticket entity - A helpdesk request raised by a user.
//!
//! Status changes go through `core::workflow`; see `TicketStatus` for the states.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Helpdesk ticket workflow status
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Waiting on the requester or a third party
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Ticket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Unique identifier for the ticket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing reference (e.g., "TK-20261018-0001")
    #[sea_orm(unique)]
    pub ticket_number: String,
    /// One-line summary
    pub title: String,
    /// Full problem description
    pub description: String,
    /// Current workflow status
    pub status: TicketStatus,
    /// User who raised the ticket
    pub requester_id: String,
    /// Technician the ticket is assigned to, if any
    pub assigned_to: Option<String>,
    /// When the ticket was raised
    pub created_at: DateTimeUtc,
    /// When the ticket was last changed
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
