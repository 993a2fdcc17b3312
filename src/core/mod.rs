//! Core business logic module.
//!
//! This module contains framework-agnostic business logic for the consumables ledger,
//! assets, budgets, maintenance, licenses, contracts, tickets and asset loans. All functions
//! take a database connection and return domain results, and any time-dependent
//! computation takes `now` explicitly.

pub mod asset;
pub mod borrow;
pub mod budget;
pub mod consumable;
pub mod contract;
pub mod expiry;
pub mod ledger;
pub mod license;
pub mod maintenance;
pub mod report;
pub mod ticket;
pub mod workflow;
