//! Reservation lifecycle business logic.
//!
//! Booking, editing and the status transitions of a reservation:
//!
//! ```text
//! pending -> confirmed -> in_progress -> completed
//!    |           |            |
//!    +-----------+------------+--> cancelled
//!    +-----------+---------------> no_show
//! ```
//!
//! Every write that changes which reservations hold a table ends with a call into
//! `core::coordinator`, inside the same transaction as the write itself.

use crate::{
    core::{
        coordinator, customer,
        validation::{self, BookingCheck},
    },
    entities::{Reservation, ReservationStatus, TableStatus, dining_table, reservation},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// A booking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    /// Guest, if known
    pub customer_id: Option<i64>,
    /// Requested table
    pub table_id: Option<i64>,
    /// Date and time of the visit
    pub scheduled_at: DateTime<Utc>,
    /// Number of guests
    pub party_size: i32,
    /// Free-form notes
    pub notes: String,
    /// Staff member taking the booking
    pub created_by: Option<String>,
}

/// New values for the editable fields of a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationChanges {
    /// Guest, if known
    pub customer_id: Option<i64>,
    /// Booked table
    pub table_id: Option<i64>,
    /// Date and time of the visit
    pub scheduled_at: DateTime<Utc>,
    /// Number of guests
    pub party_size: i32,
    /// Free-form notes
    pub notes: String,
}

/// Books a table.
///
/// Runs the booking checks against the requested table, stores the reservation as
/// `pending` and holds the table.
pub async fn create_reservation(
    db: &DatabaseConnection,
    new: NewReservation,
) -> Result<reservation::Model> {
    validation::check_party_size(new.party_size)?;
    let now = Utc::now();

    let txn = db.begin().await?;
    if let Some(customer_id) = new.customer_id {
        customer::require_customer(&txn, customer_id).await?;
    }
    let table = match new.table_id {
        Some(table_id) => {
            let table = coordinator::require_table(&txn, table_id).await?;
            validation::validate_booking(
                &txn,
                BookingCheck {
                    table: &table,
                    party_size: new.party_size,
                    scheduled_at: new.scheduled_at,
                    excluding: None,
                    check_past: true,
                    check_status: true,
                },
                now,
            )
            .await?;
            Some(table)
        }
        None => {
            validation::check_not_past(new.scheduled_at, now)?;
            None
        }
    };

    let created = reservation::ActiveModel {
        customer_id: Set(new.customer_id),
        table_id: Set(new.table_id),
        scheduled_at: Set(new.scheduled_at),
        party_size: Set(new.party_size),
        status: Set(ReservationStatus::Pending),
        notes: Set(new.notes),
        created_by: Set(new.created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(table) = table {
        coordinator::hold(&txn, table).await?;
    }
    txn.commit().await?;

    info!(
        "Created reservation {} for {} guest(s) at {}",
        created.id, created.party_size, created.scheduled_at
    );
    Ok(created)
}

/// Edits a reservation that has not finished yet.
///
/// The edited reservation is left out of the conflict search. The table status
/// check applies only when the reservation moves to another table, and the past
/// check only when its time changes.
pub async fn update_reservation(
    db: &DatabaseConnection,
    reservation_id: i64,
    changes: ReservationChanges,
) -> Result<reservation::Model> {
    validation::check_party_size(changes.party_size)?;
    let now = Utc::now();

    let txn = db.begin().await?;
    let existing = require_reservation(&txn, reservation_id).await?;
    if existing.status.is_terminal() {
        return Err(Error::invalid(
            "status",
            format!("A {} reservation can no longer be edited", existing.status),
        ));
    }
    if let Some(customer_id) = changes.customer_id {
        customer::require_customer(&txn, customer_id).await?;
    }

    let previous_table = existing.table_id;
    let table_changed = previous_table != changes.table_id;
    let new_table = match changes.table_id {
        Some(table_id) => {
            let table = coordinator::require_table(&txn, table_id).await?;
            validation::validate_booking(
                &txn,
                BookingCheck {
                    table: &table,
                    party_size: changes.party_size,
                    scheduled_at: changes.scheduled_at,
                    excluding: Some(reservation_id),
                    check_past: changes.scheduled_at != existing.scheduled_at,
                    check_status: table_changed,
                },
                now,
            )
            .await?;
            Some(table)
        }
        None => {
            if changes.scheduled_at != existing.scheduled_at {
                validation::check_not_past(changes.scheduled_at, now)?;
            }
            None
        }
    };

    let seated = existing.status == ReservationStatus::InProgress;
    let mut active: reservation::ActiveModel = existing.into();
    active.customer_id = Set(changes.customer_id);
    active.table_id = Set(changes.table_id);
    active.scheduled_at = Set(changes.scheduled_at);
    active.party_size = Set(changes.party_size);
    active.notes = Set(changes.notes);
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    // A seated party only re-occupies a table it moves to; its current table keeps
    // whatever status it has, including maintenance.
    match new_table {
        Some(table) if seated && table_changed => {
            coordinator::occupy(&txn, table).await?;
        }
        Some(table) if !seated => {
            coordinator::hold(&txn, table).await?;
        }
        _ => {}
    }
    if table_changed && let Some(old_table_id) = previous_table {
        coordinator::rederive(&txn, old_table_id, None).await?;
    }
    txn.commit().await?;

    info!("Updated reservation {reservation_id}");
    Ok(updated)
}

/// Writes `to` on the reservation if its current status is one of `allowed`, then
/// re-derives its table.
async fn transition(
    db: &DatabaseConnection,
    reservation_id: i64,
    to: ReservationStatus,
    allowed: &[ReservationStatus],
) -> Result<reservation::Model> {
    let txn = db.begin().await?;
    let existing = require_reservation(&txn, reservation_id).await?;
    let from = existing.status;
    if !allowed.contains(&from) {
        warn!("Rejected reservation {reservation_id} transition {from} -> {to}");
        return Err(Error::InvalidTransition { from, to });
    }

    let table_id = existing.table_id;
    let mut active: reservation::ActiveModel = existing.into();
    active.status = Set(to);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if let Some(table_id) = table_id {
        coordinator::rederive(&txn, table_id, None).await?;
    }
    txn.commit().await?;

    info!("Reservation {reservation_id}: {from} -> {to}");
    Ok(updated)
}

/// Confirms a pending reservation. Confirming twice is harmless.
pub async fn confirm_reservation(
    db: &DatabaseConnection,
    reservation_id: i64,
) -> Result<reservation::Model> {
    transition(
        db,
        reservation_id,
        ReservationStatus::Confirmed,
        &ReservationStatus::AWAITING_ARRIVAL,
    )
    .await
}

/// Cancels a reservation that has not finished yet.
pub async fn cancel_reservation(
    db: &DatabaseConnection,
    reservation_id: i64,
) -> Result<reservation::Model> {
    transition(
        db,
        reservation_id,
        ReservationStatus::Cancelled,
        &ReservationStatus::NON_TERMINAL,
    )
    .await
}

/// Marks a reservation as completed.
pub async fn complete_reservation(
    db: &DatabaseConnection,
    reservation_id: i64,
) -> Result<reservation::Model> {
    transition(
        db,
        reservation_id,
        ReservationStatus::Completed,
        &ReservationStatus::NON_TERMINAL,
    )
    .await
}

/// Records that the guests never arrived.
pub async fn mark_no_show(
    db: &DatabaseConnection,
    reservation_id: i64,
) -> Result<reservation::Model> {
    transition(
        db,
        reservation_id,
        ReservationStatus::NoShow,
        &ReservationStatus::AWAITING_ARRIVAL,
    )
    .await
}

async fn seat<C>(
    db: &C,
    booking: reservation::Model,
    table: dining_table::Model,
) -> Result<reservation::Model>
where
    C: ConnectionTrait,
{
    if ReservationStatus::AWAITING_ARRIVAL.contains(&booking.status)
        && table.status == TableStatus::Reserved
    {
        let mut active: reservation::ActiveModel = booking.into();
        active.status = Set(ReservationStatus::InProgress);
        active.updated_at = Set(Utc::now());
        let seated = active.update(db).await?;
        let table = coordinator::occupy(db, table).await?;
        info!(
            "Checked in reservation {} at table {}",
            seated.id, table.number
        );
        return Ok(seated);
    }

    warn!(
        "Check-in refused for reservation {} ({}) at table {} ({})",
        booking.id, booking.status, table.number, table.status
    );
    Err(Error::NoActiveReservation {
        table_number: table.number,
    })
}

/// Checks the guests of a reservation in: the reservation goes `in_progress` and
/// its table `occupied`.
///
/// The reservation must be pending or confirmed and its table reserved.
pub async fn check_in(db: &DatabaseConnection, reservation_id: i64) -> Result<reservation::Model> {
    let txn = db.begin().await?;
    let booking = require_reservation(&txn, reservation_id).await?;
    let Some(table_id) = booking.table_id else {
        return Err(Error::invalid(
            "table_id",
            "Assign a table before checking the guests in",
        ));
    };
    let table = coordinator::require_table(&txn, table_id).await?;
    let seated = seat(&txn, booking, table).await?;
    txn.commit().await?;
    Ok(seated)
}

/// Checks in the earliest pending or confirmed reservation on a table.
pub async fn check_in_table(db: &DatabaseConnection, table_id: i64) -> Result<reservation::Model> {
    let txn = db.begin().await?;
    let table = coordinator::require_table(&txn, table_id).await?;
    let next = Reservation::find()
        .filter(reservation::Column::TableId.eq(table_id))
        .filter(reservation::Column::Status.is_in(ReservationStatus::AWAITING_ARRIVAL))
        .order_by_asc(reservation::Column::ScheduledAt)
        .one(&txn)
        .await?;
    let Some(booking) = next else {
        warn!("Table {} has no reservation to check in", table.number);
        return Err(Error::NoActiveReservation {
            table_number: table.number,
        });
    };
    let seated = seat(&txn, booking, table).await?;
    txn.commit().await?;
    Ok(seated)
}

/// Deletes a reservation and re-derives its table without it.
pub async fn delete_reservation(db: &DatabaseConnection, reservation_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = require_reservation(&txn, reservation_id).await?;
    let table_id = existing.table_id;
    existing.delete(&txn).await?;

    if let Some(table_id) = table_id {
        coordinator::rederive(&txn, table_id, Some(reservation_id)).await?;
    }
    txn.commit().await?;
    info!("Deleted reservation {reservation_id}");
    Ok(())
}

/// Finds a reservation by ID.
pub async fn get_reservation(
    db: &DatabaseConnection,
    reservation_id: i64,
) -> Result<Option<reservation::Model>> {
    Reservation::find_by_id(reservation_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a reservation or fails with `NotFound`.
pub async fn require_reservation<C>(db: &C, reservation_id: i64) -> Result<reservation::Model>
where
    C: ConnectionTrait,
{
    Reservation::find_by_id(reservation_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("reservation", reservation_id))
}

/// Lists reservations, latest scheduled first, optionally only those in `status`.
pub async fn list_reservations(
    db: &DatabaseConnection,
    status: Option<ReservationStatus>,
) -> Result<Vec<reservation::Model>> {
    let mut query = Reservation::find().order_by_desc(reservation::Column::ScheduledAt);
    if let Some(status) = status {
        query = query.filter(reservation::Column::Status.eq(status));
    }
    query.all(db).await.map_err(Into::into)
}

/// Lists every reservation on a table, latest scheduled first.
pub async fn list_for_table(
    db: &DatabaseConnection,
    table_id: i64,
) -> Result<Vec<reservation::Model>> {
    Reservation::find()
        .filter(reservation::Column::TableId.eq(table_id))
        .order_by_desc(reservation::Column::ScheduledAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists every reservation of a customer, latest scheduled first.
pub async fn list_for_customer(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Vec<reservation::Model>> {
    Reservation::find()
        .filter(reservation::Column::CustomerId.eq(customer_id))
        .order_by_desc(reservation::Column::ScheduledAt)
        .all(db)
        .await
        .map_err(Into::into)
}
