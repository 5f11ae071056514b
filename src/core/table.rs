//! Table registry business logic.
//!
//! CRUD for dining tables plus the operations that seat and release guests without
//! going through a prior booking: walk-in seating, releasing a table once the
//! visit is over, and the administrative maintenance override. Every status change
//! goes through `core::coordinator`.

use crate::{
    core::{coordinator, validation},
    entities::{
        DiningTable, Location, Order, OrderStatus, Reservation, ReservationStatus, TableStatus,
        dining_table, order, reservation,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{info, warn};

/// Editable attributes of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Table number, unique
    pub number: i32,
    /// Seats
    pub capacity: i32,
    /// Area of the restaurant
    pub location: Location,
}

/// A party seated without a prior booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkIn {
    /// Table to seat the party at
    pub table_id: i64,
    /// Number of guests
    pub party_size: i32,
    /// Guest, if known
    pub customer_id: Option<i64>,
    /// Staff member seating the party
    pub created_by: Option<String>,
}

fn validate_spec(spec: &TableSpec) -> Result<()> {
    if spec.number < 1 {
        return Err(Error::invalid("number", "Table number must be positive"));
    }
    if spec.capacity < 1 {
        return Err(Error::invalid("capacity", "Capacity must be at least 1"));
    }
    Ok(())
}

async fn ensure_number_free<C>(db: &C, number: i32, excluding: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut query = DiningTable::find().filter(dining_table::Column::Number.eq(number));
    if let Some(id) = excluding {
        query = query.filter(dining_table::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(Error::invalid(
            "number",
            format!("Table number {number} already exists"),
        ));
    }
    Ok(())
}

/// Creates a new, available table.
pub async fn create_table(db: &DatabaseConnection, spec: TableSpec) -> Result<dining_table::Model> {
    validate_spec(&spec)?;
    ensure_number_free(db, spec.number, None).await?;

    let table = dining_table::ActiveModel {
        number: Set(spec.number),
        capacity: Set(spec.capacity),
        location: Set(spec.location),
        status: Set(TableStatus::Available),
        ..Default::default()
    };
    let table = table.insert(db).await?;
    info!("Created table {} ({} seats)", table.number, table.capacity);
    Ok(table)
}

/// Updates number, capacity and location of a table. The status is left alone.
pub async fn update_table(
    db: &DatabaseConnection,
    table_id: i64,
    spec: TableSpec,
) -> Result<dining_table::Model> {
    validate_spec(&spec)?;
    let table = coordinator::require_table(db, table_id).await?;
    ensure_number_free(db, spec.number, Some(table_id)).await?;

    let mut active: dining_table::ActiveModel = table.into();
    active.number = Set(spec.number);
    active.capacity = Set(spec.capacity);
    active.location = Set(spec.location);
    active.update(db).await.map_err(Into::into)
}

/// Finds a table by its unique ID.
pub async fn get_table(db: &DatabaseConnection, table_id: i64) -> Result<Option<dining_table::Model>> {
    DiningTable::find_by_id(table_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a table or fails with `NotFound`.
pub async fn require_table(db: &DatabaseConnection, table_id: i64) -> Result<dining_table::Model> {
    coordinator::require_table(db, table_id).await
}

/// Finds a table by its number.
pub async fn get_table_by_number(
    db: &DatabaseConnection,
    number: i32,
) -> Result<Option<dining_table::Model>> {
    DiningTable::find()
        .filter(dining_table::Column::Number.eq(number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists tables ordered by number, optionally only those in `status`.
pub async fn list_tables(
    db: &DatabaseConnection,
    status: Option<TableStatus>,
) -> Result<Vec<dining_table::Model>> {
    let mut query = DiningTable::find().order_by_asc(dining_table::Column::Number);
    if let Some(status) = status {
        query = query.filter(dining_table::Column::Status.eq(status));
    }
    query.all(db).await.map_err(Into::into)
}

/// Number of non-terminal reservations attached to a table.
pub async fn active_reservation_count(db: &DatabaseConnection, table_id: i64) -> Result<u64> {
    Reservation::find()
        .filter(reservation::Column::TableId.eq(table_id))
        .filter(reservation::Column::Status.is_in(ReservationStatus::NON_TERMINAL))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Deletes a table. Reservations and orders that pointed at it keep existing with
/// no table.
pub async fn delete_table(db: &DatabaseConnection, table_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let table = coordinator::require_table(&txn, table_id).await?;

    Reservation::update_many()
        .col_expr(reservation::Column::TableId, Expr::value(Option::<i64>::None))
        .filter(reservation::Column::TableId.eq(table_id))
        .exec(&txn)
        .await?;
    Order::update_many()
        .col_expr(order::Column::TableId, Expr::value(Option::<i64>::None))
        .filter(order::Column::TableId.eq(table_id))
        .exec(&txn)
        .await?;

    let number = table.number;
    table.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted table {number}");
    Ok(())
}

/// Takes a table out of service.
pub async fn set_maintenance(db: &DatabaseConnection, table_id: i64) -> Result<dining_table::Model> {
    let table = coordinator::require_table(db, table_id).await?;
    coordinator::write_status(db, table, TableStatus::Maintenance).await
}

/// Puts a table back in service with the status its current claims imply.
pub async fn clear_maintenance(
    db: &DatabaseConnection,
    table_id: i64,
) -> Result<dining_table::Model> {
    let txn = db.begin().await?;
    let table = coordinator::require_table(&txn, table_id).await?;
    if table.status != TableStatus::Maintenance {
        txn.commit().await?;
        return Ok(table);
    }
    let claims = coordinator::load_claims(&txn, table_id, None).await?;
    let table = coordinator::write_status(&txn, table, coordinator::restore_status(claims)).await?;
    txn.commit().await?;
    Ok(table)
}

/// Seats a party without a booking.
///
/// The table must be available. An in-progress reservation scheduled now is
/// recorded for the party so that orders can be placed against the table.
pub async fn seat_walk_in(db: &DatabaseConnection, walk_in: WalkIn) -> Result<reservation::Model> {
    validation::check_party_size(walk_in.party_size)?;

    let txn = db.begin().await?;
    let table = coordinator::require_table(&txn, walk_in.table_id).await?;
    validation::check_capacity(&table, walk_in.party_size)?;
    if table.status != TableStatus::Available {
        return Err(Error::TableUnavailable {
            table_number: table.number,
            status: table.status,
        });
    }

    let now = Utc::now();
    let seated = reservation::ActiveModel {
        customer_id: Set(walk_in.customer_id),
        table_id: Set(Some(table.id)),
        scheduled_at: Set(now),
        party_size: Set(walk_in.party_size),
        status: Set(ReservationStatus::InProgress),
        notes: Set("Walk-in".to_string()),
        created_by: Set(walk_in.created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let table = coordinator::occupy(&txn, table).await?;
    txn.commit().await?;
    info!(
        "Seated walk-in party of {} at table {}",
        seated.party_size, table.number
    );
    Ok(seated)
}

/// Ends the visit at a table: completes its in-progress reservations and
/// re-derives the status.
///
/// Fails with `OpenOrders` while orders on the table are neither paid nor cancelled.
pub async fn release_table(db: &DatabaseConnection, table_id: i64) -> Result<dining_table::Model> {
    let txn = db.begin().await?;
    let table = coordinator::require_table(&txn, table_id).await?;

    let open_orders = Order::find()
        .filter(order::Column::TableId.eq(table_id))
        .filter(order::Column::Status.is_in(OrderStatus::ACTIVE))
        .count(&txn)
        .await?;
    if open_orders > 0 {
        warn!(
            "Refusing to release table {}: {open_orders} open order(s)",
            table.number
        );
        return Err(Error::OpenOrders {
            table_number: table.number,
            count: open_orders,
        });
    }

    let completed = Reservation::update_many()
        .col_expr(
            reservation::Column::Status,
            Expr::value(ReservationStatus::Completed),
        )
        .col_expr(reservation::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(reservation::Column::TableId.eq(table_id))
        .filter(reservation::Column::Status.eq(ReservationStatus::InProgress))
        .exec(&txn)
        .await?;

    let table = coordinator::rederive(&txn, table_id, None).await?;
    txn.commit().await?;
    info!(
        "Released table {} ({} reservation(s) completed)",
        table.number, completed.rows_affected
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{order as orders, reservation as reservations};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_table_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_table(
            &db,
            TableSpec {
                number: 0,
                capacity: 4,
                location: Location::MainHall,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidInput { field: "number", .. }
        ));

        let result = create_table(
            &db,
            TableSpec {
                number: 1,
                capacity: 0,
                location: Location::MainHall,
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidInput {
                field: "capacity",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_table_numbers_are_unique() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_table(&db, 1, 4).await?;

        let result = create_test_table(&db, 1, 2).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidInput { field: "number", .. }
        ));

        let other = create_test_table(&db, 2, 2).await?;
        let result = update_table(
            &db,
            other.id,
            TableSpec {
                number: 1,
                capacity: 2,
                location: Location::Bar,
            },
        )
        .await;
        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_new_table_is_available() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 3, 6).await?;
        assert_eq!(table.status, TableStatus::Available);
        assert_eq!(table.capacity, 6);
        assert_eq!(get_table_by_number(&db, 3).await?.unwrap().id, table.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_tables_by_status() -> Result<()> {
        let db = setup_test_db().await?;
        let t2 = create_test_table(&db, 2, 4).await?;
        create_test_table(&db, 1, 4).await?;
        set_maintenance(&db, t2.id).await?;

        let all = list_tables(&db, None).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].number, 1);
        assert_eq!(all[1].number, 2);

        let maintenance = list_tables(&db, Some(TableStatus::Maintenance)).await?;
        assert_eq!(maintenance.len(), 1);
        assert_eq!(maintenance[0].id, t2.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_maintenance_override_and_restore() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 5, 4).await?;
        reservations::create_reservation(&db, test_booking(table.id, 2)).await?;

        let table = set_maintenance(&db, table.id).await?;
        assert_eq!(table.status, TableStatus::Maintenance);

        let table = clear_maintenance(&db, table.id).await?;
        assert_eq!(table.status, TableStatus::Reserved);
        Ok(())
    }

    #[tokio::test]
    async fn test_walk_in_occupies_table() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 7, 4).await?;

        let seated = seat_walk_in(
            &db,
            WalkIn {
                table_id: table.id,
                party_size: 3,
                customer_id: None,
                created_by: Some("ana".to_string()),
            },
        )
        .await?;
        assert_eq!(seated.status, ReservationStatus::InProgress);

        let table = get_table(&db, table.id).await?.unwrap();
        assert_eq!(table.status, TableStatus::Occupied);

        let placed = orders::create_for_table(&db, table.id, None).await?;
        assert!(placed.created);
        Ok(())
    }

    #[tokio::test]
    async fn test_walk_in_rejected_when_table_busy_or_small() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 8, 2).await?;

        let too_many = seat_walk_in(
            &db,
            WalkIn {
                table_id: table.id,
                party_size: 3,
                customer_id: None,
                created_by: None,
            },
        )
        .await;
        assert!(matches!(too_many.unwrap_err(), Error::CapacityExceeded { .. }));

        reservations::create_reservation(&db, test_booking(table.id, 2)).await?;
        let reserved = seat_walk_in(
            &db,
            WalkIn {
                table_id: table.id,
                party_size: 2,
                customer_id: None,
                created_by: None,
            },
        )
        .await;
        assert!(matches!(
            reserved.unwrap_err(),
            Error::TableUnavailable {
                status: TableStatus::Reserved,
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_release_requires_closed_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let (table, _) = setup_seated_table(&db, 4).await?;
        let placed = orders::create_for_table(&db, table.id, None).await?;

        let result = release_table(&db, table.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::OpenOrders { count: 1, .. }
        ));

        orders::set_order_status(&db, placed.order.id, OrderStatus::Paid).await?;
        let table = release_table(&db, table.id).await?;
        assert_eq!(table.status, TableStatus::Available);
        assert_eq!(active_reservation_count(&db, table.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_table_keeps_reservations() -> Result<()> {
        let db = setup_test_db().await?;
        let table = create_test_table(&db, 9, 4).await?;
        let booked = reservations::create_reservation(&db, test_booking(table.id, 2)).await?;

        delete_table(&db, table.id).await?;

        assert!(get_table(&db, table.id).await?.is_none());
        let kept = reservations::get_reservation(&db, booked.id).await?.unwrap();
        assert_eq!(kept.table_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_table() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_table(&db, 999).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "table",
                id: 999
            }
        ));
        Ok(())
    }
}
