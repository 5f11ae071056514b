//! Order entity - The items purchased during a visit, a takeout or a delivery.
//!
//! `total` is derived from the order's lines by `core::order::recalculate_total`
//! and is never written from user input. Lines are deleted together with the order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Served at a table
    #[sea_orm(string_value = "dine_in")]
    DineIn,
    /// Picked up by the guest
    #[sea_orm(string_value = "takeout")]
    Takeout,
    /// Delivered to the guest
    #[sea_orm(string_value = "delivery")]
    Delivery,
}

/// Kitchen and payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Taken, not yet sent to the kitchen
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being prepared
    #[sea_orm(string_value = "preparing")]
    Preparing,
    /// Ready to serve
    #[sea_orm(string_value = "ready")]
    Ready,
    /// On the table
    #[sea_orm(string_value = "served")]
    Served,
    /// Settled
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Voided
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Statuses of an order that is still open on its table.
    pub const ACTIVE: [Self; 4] = [Self::Pending, Self::Preparing, Self::Ready, Self::Served];

    /// Whether the order still holds its table.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Stable lowercase name, as stored and as used in query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Served => "served",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status filter value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "served" => Some(Self::Served),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Table the order is served at
    pub table_id: Option<i64>,
    /// Customer the order belongs to
    pub customer_id: Option<i64>,
    /// Fulfilment kind
    pub kind: OrderKind,
    /// Current status
    pub status: OrderStatus,
    /// Free-form notes
    pub notes: String,
    /// Sum of line subtotals, minus any applied discount
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total: Decimal,
    /// Staff member handling the order
    pub handled_by: Option<String>,
    /// When the order was placed
    pub placed_at: DateTimeUtc,
    /// Last modification
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order may be served at a table
    #[sea_orm(
        belongs_to = "super::dining_table::Entity",
        from = "Column::TableId",
        to = "super::dining_table::Column::Id",
        on_delete = "SetNull"
    )]
    DiningTable,
    /// Each order may belong to a customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "SetNull"
    )]
    Customer,
    /// One order has many lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    Lines,
}

impl Related<super::dining_table::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiningTable.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
