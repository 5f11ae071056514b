//! Shared test utilities for the dining room.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        customer::{self, CustomerDetails},
        menu,
        reservation::{self, NewReservation},
        table::{self, TableSpec},
    },
    entities::{self, Location},
    errors::Result,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a table in the main hall.
pub async fn create_test_table(
    db: &DatabaseConnection,
    number: i32,
    capacity: i32,
) -> Result<entities::dining_table::Model> {
    table::create_table(
        db,
        TableSpec {
            number,
            capacity,
            location: Location::MainHall,
        },
    )
    .await
}

/// Creates a customer with only a name.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        CustomerDetails {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Creates an available, uncategorised menu item.
pub async fn create_test_item(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
) -> Result<entities::menu_item::Model> {
    menu::create_item(
        db,
        menu::ItemSpec {
            name: name.to_string(),
            description: String::new(),
            category_id: None,
            price: Decimal::from(price),
            available: true,
            prep_minutes: menu::DEFAULT_PREP_MINUTES,
        },
    )
    .await
}

/// Builds a booking request two days from now.
///
/// # Defaults
/// * `customer_id`: None
/// * `notes`: empty
/// * `created_by`: `"test_staff"`
#[must_use]
pub fn test_booking(table_id: i64, party_size: i32) -> NewReservation {
    NewReservation {
        customer_id: None,
        table_id: Some(table_id),
        scheduled_at: Utc::now() + Duration::days(2),
        party_size,
        notes: String::new(),
        created_by: Some("test_staff".to_string()),
    }
}

/// Sets up table 99 with a booked and checked-in party of two.
/// Returns (table, reservation) with the table occupied.
pub async fn setup_seated_table(
    db: &DatabaseConnection,
    capacity: i32,
) -> Result<(entities::dining_table::Model, entities::reservation::Model)> {
    let created = create_test_table(db, 99, capacity).await?;
    let booked = reservation::create_reservation(db, test_booking(created.id, 2)).await?;
    let seated = reservation::check_in(db, booked.id).await?;
    let occupied = table::require_table(db, created.id).await?;
    Ok((occupied, seated))
}
