//! Table status coordination.
//!
//! A table's status reflects the strongest claim currently held on it:
//! `maintenance` (manual) > `occupied` (seated reservation or open order) >
//! `reserved` (pending or confirmed reservation) > `available`.
//!
//! Reservation and order lifecycles never write a table's status themselves; they
//! call into this module after every status-changing write. Re-derivation only moves
//! a table between `reserved` and `available`. `occupied` is set exclusively by
//! [`occupy`] (check-in and walk-in seating) and `maintenance` only by the
//! administrative override in `core::table`.

use crate::{
    entities::{
        DiningTable, Order, OrderStatus, Reservation, ReservationStatus, TableStatus,
        dining_table, order, reservation,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, Set, prelude::*};
use tracing::{debug, info};

/// Claims currently attached to a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableClaims {
    /// Pending or confirmed reservations
    pub awaiting: u64,
    /// In-progress reservations
    pub seated: u64,
    /// Orders that are neither paid nor cancelled
    pub open_orders: u64,
}

impl TableClaims {
    /// Whether guests are currently using the table.
    #[must_use]
    pub const fn is_occupying(self) -> bool {
        self.seated > 0 || self.open_orders > 0
    }

    /// Number of non-terminal reservations.
    #[must_use]
    pub const fn reservations(self) -> u64 {
        self.awaiting + self.seated
    }
}

/// Re-derives a table status after a reservation or order changed.
///
/// `maintenance` is never overridden, and `occupied` holds as long as an occupying
/// claim remains. Otherwise the table is `reserved` while any non-terminal
/// reservation exists and `available` when none does. This never yields `occupied`.
#[must_use]
pub const fn derive_status(current: TableStatus, claims: TableClaims) -> TableStatus {
    match current {
        TableStatus::Maintenance => TableStatus::Maintenance,
        TableStatus::Occupied if claims.is_occupying() => TableStatus::Occupied,
        _ if claims.reservations() > 0 => TableStatus::Reserved,
        _ => TableStatus::Available,
    }
}

/// Status a table returns to when maintenance is lifted.
#[must_use]
pub const fn restore_status(claims: TableClaims) -> TableStatus {
    if claims.is_occupying() {
        TableStatus::Occupied
    } else if claims.reservations() > 0 {
        TableStatus::Reserved
    } else {
        TableStatus::Available
    }
}

/// Counts the claims on `table_id`, optionally ignoring one reservation.
///
/// `excluding` covers the delete path, where the removed reservation must not be
/// counted even if the read happens to see it.
pub async fn load_claims<C>(db: &C, table_id: i64, excluding: Option<i64>) -> Result<TableClaims>
where
    C: ConnectionTrait,
{
    let reservations = |statuses: &[ReservationStatus]| {
        let mut query = Reservation::find()
            .filter(reservation::Column::TableId.eq(table_id))
            .filter(reservation::Column::Status.is_in(statuses.iter().copied()));
        if let Some(id) = excluding {
            query = query.filter(reservation::Column::Id.ne(id));
        }
        query
    };

    let awaiting = reservations(&ReservationStatus::AWAITING_ARRIVAL[..])
        .count(db)
        .await?;
    let seated = reservations(&[ReservationStatus::InProgress][..])
        .count(db)
        .await?;
    let open_orders = Order::find()
        .filter(order::Column::TableId.eq(table_id))
        .filter(order::Column::Status.is_in(OrderStatus::ACTIVE))
        .count(db)
        .await?;

    Ok(TableClaims {
        awaiting,
        seated,
        open_orders,
    })
}

/// Loads a table or fails with `NotFound`.
pub async fn require_table<C>(db: &C, table_id: i64) -> Result<dining_table::Model>
where
    C: ConnectionTrait,
{
    DiningTable::find_by_id(table_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("table", table_id))
}

/// Persists `status` on the table if it differs from the stored one.
pub(crate) async fn write_status<C>(
    db: &C,
    table: dining_table::Model,
    status: TableStatus,
) -> Result<dining_table::Model>
where
    C: ConnectionTrait,
{
    if table.status == status {
        return Ok(table);
    }
    let number = table.number;
    let from = table.status;
    let mut active: dining_table::ActiveModel = table.into();
    active.status = Set(status);
    let updated = active.update(db).await?;
    info!("Table {number}: {from} -> {status}");
    Ok(updated)
}

/// Recomputes and stores the status of `table_id` from its current claims.
pub async fn rederive<C>(
    db: &C,
    table_id: i64,
    excluding: Option<i64>,
) -> Result<dining_table::Model>
where
    C: ConnectionTrait,
{
    let table = require_table(db, table_id).await?;
    let claims = load_claims(db, table_id, excluding).await?;
    let status = derive_status(table.status, claims);
    debug!(
        "Re-deriving table {}: {:?} gives {status}",
        table.number, claims
    );
    write_status(db, table, status).await
}

/// Places a booking hold on the table. Only an `available` table changes; a table
/// that is already reserved, occupied or under maintenance keeps its status.
pub async fn hold<C>(db: &C, table: dining_table::Model) -> Result<dining_table::Model>
where
    C: ConnectionTrait,
{
    match table.status {
        TableStatus::Available => write_status(db, table, TableStatus::Reserved).await,
        _ => Ok(table),
    }
}

/// Marks the table as occupied. Reserved for check-in and walk-in seating.
pub async fn occupy<C>(db: &C, table: dining_table::Model) -> Result<dining_table::Model>
where
    C: ConnectionTrait,
{
    write_status(db, table, TableStatus::Occupied).await
}
