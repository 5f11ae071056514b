//! Dining table entity - A physical seating unit in the restaurant.
//!
//! Each table has a unique number, a seating capacity, a location inside the
//! restaurant and an occupancy status. The status is maintained by the reservation
//! and order lifecycles through `core::coordinator`; only the maintenance flag is
//! set by hand.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the restaurant a table stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Main dining hall
    #[sea_orm(string_value = "main_hall")]
    MainHall,
    /// Outdoor terrace
    #[sea_orm(string_value = "terrace")]
    Terrace,
    /// VIP room
    #[sea_orm(string_value = "vip")]
    Vip,
    /// Bar counter
    #[sea_orm(string_value = "bar")]
    Bar,
}

/// Occupancy status of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Free, no claims held
    #[sea_orm(string_value = "available")]
    Available,
    /// Guests are seated
    #[sea_orm(string_value = "occupied")]
    Occupied,
    /// Held by a pending or confirmed reservation
    #[sea_orm(string_value = "reserved")]
    Reserved,
    /// Taken out of service by an administrator
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
}

impl TableStatus {
    /// Stable lowercase name, as stored and as used in query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Maintenance => "maintenance",
        }
    }

    /// Parses a status filter value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "occupied" => Some(Self::Occupied),
            "reserved" => Some(Self::Reserved),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }

    /// Whether new reservations may be taken while the table is in this status.
    #[must_use]
    pub const fn accepts_bookings(self) -> bool {
        matches!(self, Self::Available | Self::Reserved)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dining_tables")]
pub struct Model {
    /// Unique identifier for the table
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Number painted on the table, unique across the restaurant
    #[sea_orm(unique)]
    pub number: i32,
    /// Seats available
    pub capacity: i32,
    /// Area of the restaurant
    pub location: Location,
    /// Current occupancy status
    pub status: TableStatus,
}

/// Defines relationships between tables and the records that claim them
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One table has many reservations
    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservations,
    /// One table has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
