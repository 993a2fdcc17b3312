//! Status workflows - Explicit transition tables for asset, ticket, borrow and PM statuses.
//!
//! A status may only move along an edge listed in its table. Staying in the same status
//! is not a transition and is rejected too, so callers notice no-op updates.

use crate::{
    entities::{AssetStatus, BorrowStatus, PmStatus, TicketStatus},
    errors::{Error, Result},
};
use sea_orm::{ActiveEnum, Iterable};

/// A closed set of statuses with a fixed transition table.
pub trait Workflow: ActiveEnum<Value = String> + Copy + Eq {
    /// Whether `self -> next` is an allowed edge.
    fn can_transition_to(self, next: Self) -> bool;

    /// Stored string form of the status.
    fn label(self) -> String {
        self.to_value()
    }

    /// A terminal status has no outgoing edges.
    fn is_terminal(self) -> bool {
        Self::iter().all(|next| !self.can_transition_to(next))
    }

    /// Statuses reachable from `self` in one step.
    fn next_statuses(self) -> Vec<Self> {
        Self::iter().filter(|&next| self.can_transition_to(next)).collect()
    }
}

/// Rejects a disallowed status change with [`Error::InvalidTransition`].
pub fn ensure_transition<S: Workflow>(from: S, to: S) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: from.label(),
            to: to.label(),
        })
    }
}

impl Workflow for AssetStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use AssetStatus::{Available, InUse, Lost, Maintenance, Retired};
        matches!(
            (self, next),
            (Available, InUse | Maintenance | Retired | Lost)
                | (InUse, Available | Maintenance | Retired | Lost)
                | (Maintenance | Lost, Available | Retired)
        )
    }
}

impl Workflow for TicketStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use TicketStatus::{Assigned, Cancelled, Closed, InProgress, Open, Pending, Resolved};
        matches!(
            (self, next),
            (Open, Assigned | InProgress | Cancelled)
                | (Assigned, InProgress | Pending | Cancelled)
                | (InProgress, Pending | Resolved | Cancelled)
                | (Pending, Assigned | InProgress | Resolved | Cancelled)
                | (Resolved, Closed | InProgress)
        )
    }
}

impl Workflow for BorrowStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use BorrowStatus::{Approved, Borrowed, Pending, Rejected, Returned};
        matches!(
            (self, next),
            (Pending, Approved | Rejected) | (Approved, Borrowed | Returned) | (Borrowed, Returned)
        )
    }
}

impl Workflow for PmStatus {
    fn can_transition_to(self, next: Self) -> bool {
        use PmStatus::{Cancelled, Completed, InProgress, Scheduled};
        matches!(
            (self, next),
            (Scheduled, InProgress | Completed | Cancelled)
                | (InProgress, Completed | Cancelled)
                | (Completed | Cancelled, Scheduled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_happy_path() {
        use TicketStatus::{Assigned, Closed, InProgress, Open, Resolved};
        let path = [Open, Assigned, InProgress, Resolved, Closed];
        for pair in path.windows(2) {
            assert!(ensure_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn test_ticket_closed_is_terminal() {
        assert!(TicketStatus::Closed.is_terminal());
        assert!(TicketStatus::Cancelled.is_terminal());
        assert!(!TicketStatus::Resolved.is_terminal());

        let result = ensure_transition(TicketStatus::Closed, TicketStatus::Open);
        assert!(matches!(
            result,
            Err(Error::InvalidTransition { ref from, ref to }) if from == "closed" && to == "open"
        ));
    }

    #[test]
    fn test_ticket_reopen_from_resolved() {
        assert!(TicketStatus::Resolved.can_transition_to(TicketStatus::InProgress));
        assert!(!TicketStatus::Open.can_transition_to(TicketStatus::Resolved));
    }

    #[test]
    fn test_same_status_is_not_a_transition() {
        for status in TicketStatus::iter() {
            assert!(!status.can_transition_to(status));
        }
        for status in BorrowStatus::iter() {
            assert!(!status.can_transition_to(status));
        }
        for status in PmStatus::iter() {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_borrow_table() {
        use BorrowStatus::{Approved, Borrowed, Pending, Rejected, Returned};
        assert_eq!(Pending.next_statuses(), vec![Approved, Rejected]);
        assert_eq!(Approved.next_statuses(), vec![Borrowed, Returned]);
        assert_eq!(Borrowed.next_statuses(), vec![Returned]);
        assert!(Rejected.is_terminal());
        assert!(Returned.is_terminal());
        assert!(ensure_transition(Returned, Borrowed).is_err());
    }

    #[test]
    fn test_pm_cycle() {
        use PmStatus::{Cancelled, Completed, InProgress, Scheduled};
        assert!(ensure_transition(Scheduled, InProgress).is_ok());
        assert!(ensure_transition(InProgress, Completed).is_ok());
        assert!(ensure_transition(Completed, Scheduled).is_ok());
        assert!(ensure_transition(Cancelled, Scheduled).is_ok());
        assert!(ensure_transition(Completed, InProgress).is_err());
        assert!(!Completed.is_terminal());
    }

    #[test]
    fn test_asset_table() {
        use AssetStatus::{Available, InUse, Lost, Maintenance, Retired};
        assert!(ensure_transition(Available, InUse).is_ok());
        assert!(ensure_transition(Maintenance, Available).is_ok());
        assert!(ensure_transition(Lost, Available).is_ok());
        assert!(ensure_transition(Maintenance, InUse).is_err());
        assert!(Retired.is_terminal());
        for status in AssetStatus::iter() {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_labels_match_stored_values() {
        assert_eq!(TicketStatus::InProgress.label(), "in_progress");
        assert_eq!(BorrowStatus::Borrowed.label(), "borrowed");
        assert_eq!(PmStatus::Scheduled.label(), "scheduled");
        assert_eq!(AssetStatus::InUse.label(), "in_use");
    }
}
