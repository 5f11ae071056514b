//! Order lifecycle business logic.
//!
//! Orders collect the lines served during a visit (or for takeout and delivery).
//! `total` is a stored value: every line mutation recalculates it, and a discount
//! rewrites it directly. Nothing computes it at read time.

use crate::{
    core::{coordinator, customer},
    entities::{
        Order, OrderKind, OrderLine, OrderStatus, Reservation, ReservationStatus, menu_item,
        order, order_line, reservation,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, warn};

/// Result of [`create_for_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOrder {
    /// The table's active order
    pub order: order::Model,
    /// Whether the order was created by this call
    pub created: bool,
}

/// A manually entered order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Table, for dine-in orders
    pub table_id: Option<i64>,
    /// Customer, if known
    pub customer_id: Option<i64>,
    /// Fulfilment kind
    pub kind: OrderKind,
    /// Free-form notes
    pub notes: String,
    /// Staff member taking the order
    pub handled_by: Option<String>,
}

/// New values for the editable fields of an order. The total is not editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChanges {
    /// Table
    pub table_id: Option<i64>,
    /// Customer
    pub customer_id: Option<i64>,
    /// Fulfilment kind
    pub kind: OrderKind,
    /// Status
    pub status: OrderStatus,
    /// Free-form notes
    pub notes: String,
}

/// `quantity * unit_price`, rounded to cents.
#[must_use]
pub fn line_subtotal(quantity: i32, unit_price: Decimal) -> Decimal {
    (Decimal::from(quantity) * unit_price).round_dp(2)
}

fn check_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::invalid("quantity", "Quantity must be at least 1"));
    }
    Ok(())
}

/// Finds the order that is still open on a table, if any.
pub async fn active_order_for_table<C>(db: &C, table_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::TableId.eq(table_id))
        .filter(order::Column::Status.is_in(OrderStatus::ACTIVE))
        .order_by_desc(order::Column::PlacedAt)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Opens an order for the party seated at a table.
///
/// The table needs an in-progress reservation. When the table already has an
/// active order, that order is returned with `created == false`.
pub async fn create_for_table(
    db: &DatabaseConnection,
    table_id: i64,
    handled_by: Option<String>,
) -> Result<TableOrder> {
    let txn = db.begin().await?;
    let table = coordinator::require_table(&txn, table_id).await?;

    let seated = Reservation::find()
        .filter(reservation::Column::TableId.eq(table_id))
        .filter(reservation::Column::Status.eq(ReservationStatus::InProgress))
        .order_by_asc(reservation::Column::ScheduledAt)
        .one(&txn)
        .await?;
    let Some(seated) = seated else {
        warn!("Table {} has no seated party; order not created", table.number);
        return Err(Error::NoActiveReservation {
            table_number: table.number,
        });
    };

    if let Some(existing) = active_order_for_table(&txn, table_id).await? {
        txn.commit().await?;
        debug!("Reusing order {} on table {}", existing.id, table.number);
        return Ok(TableOrder {
            order: existing,
            created: false,
        });
    }

    let now = Utc::now();
    let created = order::ActiveModel {
        table_id: Set(Some(table_id)),
        customer_id: Set(seated.customer_id),
        kind: Set(OrderKind::DineIn),
        status: Set(OrderStatus::Pending),
        notes: Set(String::new()),
        total: Set(Decimal::ZERO),
        handled_by: Set(handled_by),
        placed_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Opened order {} on table {}", created.id, table.number);
    Ok(TableOrder {
        order: created,
        created: true,
    })
}

/// Creates an order without going through a seated table.
pub async fn create_order(db: &DatabaseConnection, new: NewOrder) -> Result<order::Model> {
    let txn = db.begin().await?;
    if let Some(table_id) = new.table_id {
        coordinator::require_table(&txn, table_id).await?;
    }
    if let Some(customer_id) = new.customer_id {
        customer::require_customer(&txn, customer_id).await?;
    }

    let now = Utc::now();
    let created = order::ActiveModel {
        table_id: Set(new.table_id),
        customer_id: Set(new.customer_id),
        kind: Set(new.kind),
        status: Set(OrderStatus::Pending),
        notes: Set(new.notes),
        total: Set(Decimal::ZERO),
        handled_by: Set(new.handled_by),
        placed_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Created {:?} order {}", created.kind, created.id);
    Ok(created)
}

/// Edits an order. Tables it leaves or joins are re-derived.
pub async fn update_order(
    db: &DatabaseConnection,
    order_id: i64,
    changes: OrderChanges,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let existing = require_order(&txn, order_id).await?;
    if let Some(table_id) = changes.table_id {
        coordinator::require_table(&txn, table_id).await?;
    }
    if let Some(customer_id) = changes.customer_id {
        customer::require_customer(&txn, customer_id).await?;
    }

    let previous_table = existing.table_id;
    let previous_status = existing.status;
    let mut active: order::ActiveModel = existing.into();
    active.table_id = Set(changes.table_id);
    active.customer_id = Set(changes.customer_id);
    active.kind = Set(changes.kind);
    active.status = Set(changes.status);
    active.notes = Set(changes.notes);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if previous_status != updated.status || previous_table != updated.table_id {
        for table_id in [previous_table, updated.table_id].into_iter().flatten() {
            coordinator::rederive(&txn, table_id, None).await?;
        }
    }
    txn.commit().await?;

    info!("Updated order {order_id} ({previous_status} -> {})", updated.status);
    Ok(updated)
}

/// Moves an order to `status` and re-derives its table.
pub async fn set_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let existing = require_order(&txn, order_id).await?;
    let from = existing.status;
    let table_id = existing.table_id;

    let mut active: order::ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if let Some(table_id) = table_id {
        coordinator::rederive(&txn, table_id, None).await?;
    }
    txn.commit().await?;

    info!("Order {order_id}: {from} -> {status}");
    Ok(updated)
}

/// Deletes an order and its lines.
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = require_order(&txn, order_id).await?;
    let table_id = existing.table_id;

    OrderLine::delete_many()
        .filter(order_line::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;

    if let Some(table_id) = table_id {
        coordinator::rederive(&txn, table_id, None).await?;
    }
    txn.commit().await?;
    info!("Deleted order {order_id}");
    Ok(())
}

/// Finds an order by ID.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an order or fails with `NotFound`.
pub async fn require_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))
}

async fn lines_of<C>(db: &C, order_id: i64) -> Result<Vec<order_line::Model>>
where
    C: ConnectionTrait,
{
    OrderLine::find()
        .filter(order_line::Column::OrderId.eq(order_id))
        .order_by_asc(order_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads an order together with its lines in entry order.
pub async fn get_order_with_lines(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<(order::Model, Vec<order_line::Model>)> {
    let found = require_order(db, order_id).await?;
    let lines = lines_of(db, order_id).await?;
    Ok((found, lines))
}

/// Lists orders, newest first, optionally only those in `status`.
pub async fn list_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find().order_by_desc(order::Column::PlacedAt);
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query.all(db).await.map_err(Into::into)
}

/// Stores the sum of the order's line subtotals as its total.
pub async fn recalculate_total<C>(db: &C, order_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let existing = require_order(db, order_id).await?;
    let total: Decimal = lines_of(db, order_id)
        .await?
        .iter()
        .map(|line| line.subtotal)
        .sum::<Decimal>()
        .round_dp(2);

    let mut active: order::ActiveModel = existing.into();
    active.total = Set(total);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    debug!("Order {order_id} total is now {total}");
    Ok(total)
}

/// Adds `quantity` of `item` to an order at the item's current price.
pub async fn add_line(
    db: &DatabaseConnection,
    order_id: i64,
    item: &menu_item::Model,
    quantity: i32,
    notes: String,
) -> Result<order_line::Model> {
    check_quantity(quantity)?;

    let txn = db.begin().await?;
    require_order(&txn, order_id).await?;
    let line = order_line::ActiveModel {
        order_id: Set(order_id),
        menu_item_id: Set(item.id),
        quantity: Set(quantity),
        unit_price: Set(item.price),
        subtotal: Set(line_subtotal(quantity, item.price)),
        notes: Set(notes),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    recalculate_total(&txn, order_id).await?;
    txn.commit().await?;

    info!("Order {order_id}: added {quantity} x {}", item.name);
    Ok(line)
}

async fn first_line_for<C>(db: &C, order_id: i64, item_id: i64) -> Result<Option<order_line::Model>>
where
    C: ConnectionTrait,
{
    OrderLine::find()
        .filter(order_line::Column::OrderId.eq(order_id))
        .filter(order_line::Column::MenuItemId.eq(item_id))
        .order_by_asc(order_line::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Changes the quantity of the first line for `item`.
///
/// The line is re-priced at the item's current price.
pub async fn update_line(
    db: &DatabaseConnection,
    order_id: i64,
    item: &menu_item::Model,
    quantity: i32,
) -> Result<order_line::Model> {
    check_quantity(quantity)?;

    let txn = db.begin().await?;
    require_order(&txn, order_id).await?;
    let line = first_line_for(&txn, order_id, item.id)
        .await?
        .ok_or_else(|| Error::not_found("order line", item.id))?;

    let mut active: order_line::ActiveModel = line.into();
    active.quantity = Set(quantity);
    active.unit_price = Set(item.price);
    active.subtotal = Set(line_subtotal(quantity, item.price));
    let updated = active.update(&txn).await?;
    recalculate_total(&txn, order_id).await?;
    txn.commit().await?;

    info!("Order {order_id}: {} now x {quantity}", item.name);
    Ok(updated)
}

/// Removes the first line for `item_id`. Returns `false`, leaving the order
/// untouched, when the order has no such line.
pub async fn remove_line(db: &DatabaseConnection, order_id: i64, item_id: i64) -> Result<bool> {
    let txn = db.begin().await?;
    require_order(&txn, order_id).await?;
    let Some(line) = first_line_for(&txn, order_id, item_id).await? else {
        txn.commit().await?;
        return Ok(false);
    };

    line.delete(&txn).await?;
    recalculate_total(&txn, order_id).await?;
    txn.commit().await?;

    info!("Order {order_id}: removed item {item_id}");
    Ok(true)
}

/// Takes `percent` off the current total and stores the result.
///
/// Each call discounts the already discounted total again.
pub async fn apply_discount(
    db: &DatabaseConnection,
    order_id: i64,
    percent: Decimal,
) -> Result<Decimal> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(Error::InvalidDiscount { percent });
    }

    let existing = require_order(db, order_id).await?;
    let total = (existing.total - existing.total * percent / Decimal::ONE_HUNDRED).round_dp(2);

    let mut active: order::ActiveModel = existing.into();
    active.total = Set(total);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    info!("Order {order_id}: {percent}% discount, total {total}");
    Ok(total)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{reservation as reservations, table};
    use crate::entities::TableStatus;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_for_table_requires_seated_party() -> Result<()> {
        let db = setup_test_db().await?;
        let t = create_test_table(&db, 5, 4).await?;
        reservations::create_reservation(&db, test_booking(t.id, 2)).await?;

        let result = create_for_table(&db, t.id, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NoActiveReservation { table_number: 5 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_for_table_reuses_active_order() -> Result<()> {
        let db = setup_test_db().await?;
        let guest = create_test_customer(&db, "Pablo").await?;
        let t = create_test_table(&db, 5, 4).await?;
        let mut booking = test_booking(t.id, 2);
        booking.customer_id = Some(guest.id);
        let booked = reservations::create_reservation(&db, booking).await?;
        reservations::check_in(&db, booked.id).await?;

        let first = create_for_table(&db, t.id, Some("ana".to_string())).await?;
        assert!(first.created);
        assert_eq!(first.order.status, OrderStatus::Pending);
        assert_eq!(first.order.kind, OrderKind::DineIn);
        assert_eq!(first.order.customer_id, Some(guest.id));
        assert_eq!(first.order.handled_by.as_deref(), Some("ana"));

        let second = create_for_table(&db, t.id, None).await?;
        assert!(!second.created);
        assert_eq!(second.order.id, first.order.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_line_mutations_keep_total_in_sync() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let placed = create_for_table(&db, t.id, None).await?;
        let order_id = placed.order.id;
        let item = create_test_item(&db, "Lomo saltado", 12500).await?;

        let line = add_line(&db, order_id, &item, 2, String::new()).await?;
        assert_eq!(line.subtotal, Decimal::from(25000));
        assert_eq!(require_order(&db, order_id).await?.total, Decimal::from(25000));

        let line = update_line(&db, order_id, &item, 3).await?;
        assert_eq!(line.quantity, 3);
        assert_eq!(line.subtotal, line.unit_price * Decimal::from(line.quantity));
        assert_eq!(require_order(&db, order_id).await?.total, Decimal::from(37500));

        assert!(remove_line(&db, order_id, item.id).await?);
        assert_eq!(require_order(&db, order_id).await?.total, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_missing_line_leaves_total() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let order_id = create_for_table(&db, t.id, None).await?.order.id;
        let soup = create_test_item(&db, "Soup", 8000).await?;
        let cake = create_test_item(&db, "Cake", 6000).await?;
        add_line(&db, order_id, &soup, 1, String::new()).await?;

        assert!(!remove_line(&db, order_id, cake.id).await?);
        assert_eq!(require_order(&db, order_id).await?.total, Decimal::from(8000));

        let result = update_line(&db, order_id, &cake, 2).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "order line",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_line_uses_current_price() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let order_id = create_for_table(&db, t.id, None).await?.order.id;
        let mut coffee = create_test_item(&db, "Coffee", 3000).await?;
        add_line(&db, order_id, &coffee, 2, String::new()).await?;

        coffee.price = Decimal::from(3500);
        let line = update_line(&db, order_id, &coffee, 2).await?;
        assert_eq!(line.unit_price, Decimal::from(3500));
        assert_eq!(recalculate_total(&db, order_id).await?, Decimal::from(7000));
        Ok(())
    }

    #[tokio::test]
    async fn test_quantity_must_be_positive() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let order_id = create_for_table(&db, t.id, None).await?.order.id;
        let item = create_test_item(&db, "Tea", 2500).await?;

        let result = add_line(&db, order_id, &item, 0, String::new()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidInput {
                field: "quantity",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_discount_compounds() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let order_id = create_for_table(&db, t.id, None).await?.order.id;
        let item = create_test_item(&db, "Parrillada", 10000).await?;
        add_line(&db, order_id, &item, 1, String::new()).await?;

        assert_eq!(
            apply_discount(&db, order_id, Decimal::from(10)).await?,
            Decimal::from(9000)
        );
        assert_eq!(
            apply_discount(&db, order_id, Decimal::from(10)).await?,
            Decimal::from(8100)
        );
        assert_eq!(require_order(&db, order_id).await?.total, Decimal::from(8100));

        let result = apply_discount(&db, order_id, Decimal::from(101)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidDiscount { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_order_removes_lines() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let order_id = create_for_table(&db, t.id, None).await?.order.id;
        let item = create_test_item(&db, "Ceviche", 9000).await?;
        add_line(&db, order_id, &item, 2, String::new()).await?;

        delete_order(&db, order_id).await?;

        assert!(get_order(&db, order_id).await?.is_none());
        let orphans = OrderLine::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .all(&db)
            .await?;
        assert!(orphans.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_paying_after_checkout_frees_table() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, seated) = setup_seated_table(&db, 4).await?;
        let placed = create_for_table(&db, t.id, None).await?;

        reservations::complete_reservation(&db, seated.id).await?;
        assert_eq!(
            table::get_table(&db, t.id).await?.unwrap().status,
            TableStatus::Occupied
        );

        set_order_status(&db, placed.order.id, OrderStatus::Paid).await?;
        assert_eq!(
            table::get_table(&db, t.id).await?.unwrap().status,
            TableStatus::Available
        );
        assert!(active_order_for_table(&db, t.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_manual_orders_and_listing() -> Result<()> {
        let db = setup_test_db().await?;
        let takeout = create_order(
            &db,
            NewOrder {
                table_id: None,
                customer_id: None,
                kind: OrderKind::Takeout,
                notes: "No onions".to_string(),
                handled_by: None,
            },
        )
        .await?;
        assert_eq!(takeout.total, Decimal::ZERO);

        let updated = update_order(
            &db,
            takeout.id,
            OrderChanges {
                table_id: None,
                customer_id: None,
                kind: OrderKind::Delivery,
                status: OrderStatus::Preparing,
                notes: takeout.notes.clone(),
            },
        )
        .await?;
        assert_eq!(updated.kind, OrderKind::Delivery);
        assert_eq!(updated.total, Decimal::ZERO);

        assert_eq!(list_orders(&db, None).await?.len(), 1);
        assert_eq!(list_orders(&db, Some(OrderStatus::Preparing)).await?.len(), 1);
        assert!(list_orders(&db, Some(OrderStatus::Paid)).await?.is_empty());

        let missing = create_order(
            &db,
            NewOrder {
                table_id: Some(404),
                customer_id: None,
                kind: OrderKind::DineIn,
                notes: String::new(),
                handled_by: None,
            },
        )
        .await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
