//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. Errors fall into four
//! classes (see [`ErrorClass`]) which decide how the web layer reports them:
//! validation failures are re-rendered next to the rejected input, missing records
//! end the request with a not-found page, business-rule violations redirect to a
//! list view with a notice, and everything else is an internal failure.

use crate::entities::{ReservationStatus, TableStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// How an [`Error`] should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Field-attached message; the user may correct the input and resubmit.
    Validation,
    /// A direct identity lookup found nothing.
    NotFound,
    /// The requested transition is not allowed in the current state.
    BusinessRule,
    /// Infrastructure failure (database, I/O, configuration).
    Internal,
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Party is larger than the table can seat.
    #[error("Table {table_number} seats {capacity} guests; cannot book {party_size}")]
    CapacityExceeded {
        /// Number of the requested table
        table_number: i32,
        /// Seats available at that table
        capacity: i32,
        /// Requested party size
        party_size: i32,
    },

    /// Reservation time lies before the moment of booking.
    #[error("Reservation time {scheduled_at} is in the past")]
    PastSchedule {
        /// Requested time
        scheduled_at: DateTime<Utc>,
    },

    /// Another non-terminal reservation holds the table too close to the requested time.
    #[error("Table {table_number} already has a reservation near {existing_at}; choose another time")]
    SchedulingConflict {
        /// Number of the requested table
        table_number: i32,
        /// Scheduled time of the conflicting reservation
        existing_at: DateTime<Utc>,
    },

    /// The table cannot take new bookings in its current state.
    #[error("Table {table_number} is {status} and cannot be booked")]
    TableUnavailable {
        /// Number of the requested table
        table_number: i32,
        /// Current table status
        status: TableStatus,
    },

    /// A menu item that is switched off was selected.
    #[error("Menu item '{name}' is not available")]
    ItemUnavailable {
        /// Item name
        name: String,
    },

    /// Generic field validation failure.
    #[error("{field}: {message}")]
    InvalidInput {
        /// Form field the message belongs to
        field: &'static str,
        /// Human-readable message
        message: String,
    },

    /// A record looked up by identity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (e.g. "table")
        entity: &'static str,
        /// Requested identity
        id: i64,
    },

    /// No reservation in the state the operation needs exists for the table.
    #[error("Table {table_number} has no active reservation")]
    NoActiveReservation {
        /// Number of the table
        table_number: i32,
    },

    /// Reservation status change not allowed from its current status.
    #[error("Reservation cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: ReservationStatus,
        /// Requested status
        to: ReservationStatus,
    },

    /// The table still has orders that are neither paid nor cancelled.
    #[error("Table {table_number} still has {count} open order(s)")]
    OpenOrders {
        /// Number of the table
        table_number: i32,
        /// Active orders on the table
        count: u64,
    },

    /// Discount percentage outside 0..=100.
    #[error("Invalid discount percentage: {percent}")]
    InvalidDiscount {
        /// Requested percentage
        percent: Decimal,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Details
        message: String,
    },

    /// Database error reported by SeaORM.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (binding the listener, reading files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable could not be read.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A view context could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns the surfacing class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::CapacityExceeded { .. }
            | Self::PastSchedule { .. }
            | Self::SchedulingConflict { .. }
            | Self::TableUnavailable { .. }
            | Self::ItemUnavailable { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidDiscount { .. } => ErrorClass::Validation,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::NoActiveReservation { .. }
            | Self::InvalidTransition { .. }
            | Self::OpenOrders { .. } => ErrorClass::BusinessRule,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Serialization(_) => ErrorClass::Internal,
        }
    }

    /// Form field a validation error belongs to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::CapacityExceeded { .. } => Some("party_size"),
            Self::PastSchedule { .. } | Self::SchedulingConflict { .. } => Some("scheduled_at"),
            Self::TableUnavailable { .. } => Some("table_id"),
            Self::ItemUnavailable { .. } => Some("menu_item_id"),
            Self::InvalidDiscount { .. } => Some("percent"),
            Self::InvalidInput { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub(crate) const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
