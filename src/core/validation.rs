//! Booking checks shared by reservation creation, editing and walk-in seating.
//!
//! The individual checks are plain functions over already-loaded models so they can
//! be exercised without a database. [`validate_booking`] runs them in a fixed order
//! (capacity, past schedule, table status, conflict) and reports the first failure.

use crate::{
    entities::{Reservation, ReservationStatus, dining_table, reservation},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, prelude::*};

/// Two non-terminal reservations on one table must be further apart than this.
pub const CONFLICT_WINDOW_HOURS: i64 = 2;

/// Whether two scheduled times fall within the conflict window (inclusive).
#[must_use]
pub fn within_conflict_window(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).abs() <= Duration::hours(CONFLICT_WINDOW_HOURS)
}

/// Party size must be at least one guest.
pub fn check_party_size(party_size: i32) -> Result<()> {
    if party_size < 1 {
        return Err(Error::invalid(
            "party_size",
            "Party size must be at least 1",
        ));
    }
    Ok(())
}

/// Party must fit at the table.
pub fn check_capacity(table: &dining_table::Model, party_size: i32) -> Result<()> {
    if party_size > table.capacity {
        return Err(Error::CapacityExceeded {
            table_number: table.number,
            capacity: table.capacity,
            party_size,
        });
    }
    Ok(())
}

/// Reservation time must not lie before `now`.
pub fn check_not_past(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if scheduled_at < now {
        return Err(Error::PastSchedule { scheduled_at });
    }
    Ok(())
}

/// Occupied tables and tables under maintenance take no new bookings.
pub fn check_table_accepts_bookings(table: &dining_table::Model) -> Result<()> {
    if !table.status.accepts_bookings() {
        return Err(Error::TableUnavailable {
            table_number: table.number,
            status: table.status,
        });
    }
    Ok(())
}

/// Finds the first reservation in `existing` that collides with `scheduled_at`.
///
/// `existing` is expected to hold the table's non-terminal reservations; the
/// reservation being edited is skipped through `excluding`.
#[must_use]
pub fn find_conflict(
    existing: &[reservation::Model],
    scheduled_at: DateTime<Utc>,
    excluding: Option<i64>,
) -> Option<&reservation::Model> {
    existing.iter().find(|r| {
        Some(r.id) != excluding
            && !r.status.is_terminal()
            && within_conflict_window(r.scheduled_at, scheduled_at)
    })
}

/// Loads the non-terminal reservations held on a table, earliest first.
pub async fn non_terminal_reservations<C>(
    db: &C,
    table_id: i64,
) -> Result<Vec<reservation::Model>>
where
    C: ConnectionTrait,
{
    Reservation::find()
        .filter(reservation::Column::TableId.eq(table_id))
        .filter(reservation::Column::Status.is_in(ReservationStatus::NON_TERMINAL))
        .order_by_asc(reservation::Column::ScheduledAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A booking request against a specific table.
#[derive(Debug, Clone, Copy)]
pub struct BookingCheck<'a> {
    /// Table being booked
    pub table: &'a dining_table::Model,
    /// Requested party size
    pub party_size: i32,
    /// Requested time
    pub scheduled_at: DateTime<Utc>,
    /// Reservation being edited, excluded from the conflict search
    pub excluding: Option<i64>,
    /// Whether the time must not lie in the past
    pub check_past: bool,
    /// Whether the table's current status must accept bookings
    pub check_status: bool,
}

/// Runs every booking check for a table and returns the first failure.
///
/// The conflict search reads and the caller later writes without any lock in
/// between; two concurrent requests for the same slot can both pass.
pub async fn validate_booking<C>(db: &C, check: BookingCheck<'_>, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    check_capacity(check.table, check.party_size)?;
    if check.check_past {
        check_not_past(check.scheduled_at, now)?;
    }
    if check.check_status {
        check_table_accepts_bookings(check.table)?;
    }

    let existing = non_terminal_reservations(db, check.table.id).await?;
    if let Some(conflict) = find_conflict(&existing, check.scheduled_at, check.excluding) {
        return Err(Error::SchedulingConflict {
            table_number: check.table.number,
            existing_at: conflict.scheduled_at,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Location, TableStatus};

    fn table(status: TableStatus) -> dining_table::Model {
        dining_table::Model {
            id: 1,
            number: 5,
            capacity: 4,
            location: Location::MainHall,
            status,
        }
    }

    fn booking(id: i64, scheduled_at: DateTime<Utc>, status: ReservationStatus) -> reservation::Model {
        reservation::Model {
            id,
            customer_id: None,
            table_id: Some(1),
            scheduled_at,
            party_size: 2,
            status,
            notes: String::new(),
            created_by: None,
            created_at: scheduled_at,
            updated_at: scheduled_at,
        }
    }

    #[test]
    fn test_conflict_window_is_inclusive() {
        let t = Utc::now();
        assert!(within_conflict_window(t, t + Duration::hours(2)));
        assert!(within_conflict_window(t + Duration::hours(2), t));
        assert!(within_conflict_window(t, t - Duration::minutes(30)));
        assert!(!within_conflict_window(t, t + Duration::hours(2) + Duration::seconds(1)));
    }

    #[test]
    fn test_capacity_check() {
        let t = table(TableStatus::Available);
        assert!(check_capacity(&t, 4).is_ok());
        assert!(matches!(
            check_capacity(&t, 5),
            Err(Error::CapacityExceeded {
                table_number: 5,
                capacity: 4,
                party_size: 5
            })
        ));
    }

    #[test]
    fn test_past_schedule_check() {
        let now = Utc::now();
        assert!(check_not_past(now + Duration::minutes(1), now).is_ok());
        assert!(check_not_past(now, now).is_ok());
        assert!(matches!(
            check_not_past(now - Duration::minutes(1), now),
            Err(Error::PastSchedule { .. })
        ));
    }

    #[test]
    fn test_table_status_check() {
        assert!(check_table_accepts_bookings(&table(TableStatus::Available)).is_ok());
        assert!(check_table_accepts_bookings(&table(TableStatus::Reserved)).is_ok());
        assert!(matches!(
            check_table_accepts_bookings(&table(TableStatus::Occupied)),
            Err(Error::TableUnavailable {
                status: TableStatus::Occupied,
                ..
            })
        ));
        assert!(check_table_accepts_bookings(&table(TableStatus::Maintenance)).is_err());
    }

    #[test]
    fn test_party_size_check() {
        assert!(check_party_size(1).is_ok());
        assert!(matches!(
            check_party_size(0),
            Err(Error::InvalidInput {
                field: "party_size",
                ..
            })
        ));
    }

    #[test]
    fn test_find_conflict_skips_edited_and_terminal() {
        let t = Utc::now() + Duration::days(2);
        let existing = vec![
            booking(1, t, ReservationStatus::Pending),
            booking(2, t + Duration::minutes(30), ReservationStatus::Cancelled),
        ];

        assert_eq!(find_conflict(&existing, t + Duration::hours(1), None).unwrap().id, 1);
        assert!(find_conflict(&existing, t + Duration::hours(1), Some(1)).is_none());
        assert!(find_conflict(&existing, t + Duration::hours(3), None).is_none());
    }
}
