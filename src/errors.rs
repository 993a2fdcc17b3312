//! Unified error type for every core operation.
//!
//! Each variant is scoped to a single operation: nothing here is fatal to the
//! process except failures surfaced during startup in `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input, rejected before anything is persisted
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Storage operation failed; the backend message is surfaced verbatim
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(
        "Budget exceeded: allocated {allocated:.2}, spent {spent:.2}, requested {requested:.2}"
    )]
    BudgetExceeded {
        allocated: f64,
        spent: f64,
        requested: f64,
    },

    #[error("Insufficient stock: {current} on hand, {requested} requested")]
    InsufficientStock { current: i64, requested: i64 },

    #[error("Invalid status transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// Another writer changed the row between our read and our write
    #[error("{entity} {id} was modified concurrently, reload and retry")]
    ConcurrentModification { entity: &'static str, id: i64 },

    #[error("All {total} license seats are already assigned")]
    LicenseFull { total: i32 },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
