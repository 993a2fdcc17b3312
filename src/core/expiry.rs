//! Expiry status - Shared near-expiry classification for licenses and contracts.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Days ahead of the end date at which a license or contract is flagged
pub const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 30;

/// Point-in-time expiry label; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// No end date
    Perpetual,
    /// Ends later than the warning window
    Active,
    /// Ends within the warning window
    ExpiringSoon,
    /// End date has passed
    Expired,
}

/// Classifies an optional end date against `now`.
///
/// `Expired` if the date is in the past, `ExpiringSoon` if it falls within `window`,
/// `Active` otherwise, and `Perpetual` when there is no end date.
#[must_use]
pub fn classify_expiry(
    expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> ExpiryStatus {
    match expiry {
        None => ExpiryStatus::Perpetual,
        Some(end) if end < now => ExpiryStatus::Expired,
        Some(end) if end - now <= window => ExpiryStatus::ExpiringSoon,
        Some(_) => ExpiryStatus::Active,
    }
}
