//! Reservation entity - A forward booking of a table.
//!
//! A reservation starts `pending`, may be `confirmed`, becomes `in_progress` on
//! check-in and ends `completed`, `cancelled` or `no_show`. Both the table and the
//! customer references are nullable and are cleared when the referenced row goes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Just booked
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Confirmed with the guest
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Guests checked in and seated
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Visit finished
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled before the visit
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Guests never arrived
    #[sea_orm(string_value = "no_show")]
    NoShow,
}

impl ReservationStatus {
    /// Statuses that still hold a claim on the table.
    pub const NON_TERMINAL: [Self; 3] = [Self::Pending, Self::Confirmed, Self::InProgress];

    /// Statuses from which a guest can still be checked in.
    pub const AWAITING_ARRIVAL: [Self; 2] = [Self::Pending, Self::Confirmed];

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Stable lowercase name, as stored and as used in query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Parses a status filter value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reservation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    /// Unique identifier for the reservation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Guest who booked, if known
    pub customer_id: Option<i64>,
    /// Booked table
    pub table_id: Option<i64>,
    /// Date and time of the visit
    pub scheduled_at: DateTimeUtc,
    /// Number of guests
    pub party_size: i32,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Free-form notes
    pub notes: String,
    /// Staff member who took the booking
    pub created_by: Option<String>,
    /// When the booking was taken
    pub created_at: DateTimeUtc,
    /// Last modification
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Reservation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reservation may belong to a customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "SetNull"
    )]
    Customer,
    /// Each reservation may hold a table
    #[sea_orm(
        belongs_to = "super::dining_table::Entity",
        from = "Column::TableId",
        to = "super::dining_table::Column::Id",
        on_delete = "SetNull"
    )]
    DiningTable,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::dining_table::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiningTable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
