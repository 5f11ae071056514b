//! Customer registry business logic.

use crate::{
    entities::{Customer, Order, Reservation, customer, order, reservation},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::info;

/// Contact details submitted for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    /// Full name, required
    pub name: String,
    /// Phone number
    pub phone: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Preferences, allergies and the like
    pub notes: Option<String>,
}

/// Blank optional fields are stored as NULL.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CustomerDetails {
    fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::invalid("name", "Name is required"));
        }
        let email = normalize(self.email);
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(Error::invalid("email", "Enter a valid email address"));
        }
        Ok(Self {
            name,
            phone: normalize(self.phone),
            email,
            notes: normalize(self.notes),
        })
    }
}

/// Registers a new customer.
pub async fn create_customer(
    db: &DatabaseConnection,
    details: CustomerDetails,
) -> Result<customer::Model> {
    let details = details.normalized()?;
    let customer = customer::ActiveModel {
        name: Set(details.name),
        phone: Set(details.phone),
        email: Set(details.email),
        notes: Set(details.notes),
        registered_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Registered customer {} ({})", customer.name, customer.id);
    Ok(customer)
}

/// Replaces a customer's contact details. The registration date is kept.
pub async fn update_customer(
    db: &DatabaseConnection,
    customer_id: i64,
    details: CustomerDetails,
) -> Result<customer::Model> {
    let details = details.normalized()?;
    let existing = require_customer(db, customer_id).await?;

    let mut active: customer::ActiveModel = existing.into();
    active.name = Set(details.name);
    active.phone = Set(details.phone);
    active.email = Set(details.email);
    active.notes = Set(details.notes);
    active.update(db).await.map_err(Into::into)
}

/// Finds a customer by ID.
pub async fn get_customer(db: &DatabaseConnection, customer_id: i64) -> Result<Option<customer::Model>> {
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a customer or fails with `NotFound`.
pub async fn require_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("customer", customer_id))
}

/// Lists customers ordered by name.
///
/// `search` matches as a substring of name, phone or email; a blank search lists
/// everyone.
pub async fn list_customers(
    db: &DatabaseConnection,
    search: Option<&str>,
) -> Result<Vec<customer::Model>> {
    let mut query = Customer::find().order_by_asc(customer::Column::Name);
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(customer::Column::Name.contains(term))
                .add(customer::Column::Phone.contains(term))
                .add(customer::Column::Email.contains(term)),
        );
    }
    query.all(db).await.map_err(Into::into)
}

/// Deletes a customer. Their reservations and orders remain, unattributed.
pub async fn delete_customer(db: &DatabaseConnection, customer_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = require_customer(&txn, customer_id).await?;

    Reservation::update_many()
        .col_expr(reservation::Column::CustomerId, Expr::value(Option::<i64>::None))
        .filter(reservation::Column::CustomerId.eq(customer_id))
        .exec(&txn)
        .await?;
    Order::update_many()
        .col_expr(order::Column::CustomerId, Expr::value(Option::<i64>::None))
        .filter(order::Column::CustomerId.eq(customer_id))
        .exec(&txn)
        .await?;

    existing.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted customer {customer_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::reservation as reservations;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_customer_trims_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_customer(
            &db,
            CustomerDetails {
                name: "  Rosa Díaz ".to_string(),
                phone: Some("   ".to_string()),
                email: Some("rosa@example.com".to_string()),
                notes: None,
            },
        )
        .await?;

        assert_eq!(created.name, "Rosa Díaz");
        assert_eq!(created.phone, None);
        assert_eq!(created.email.as_deref(), Some("rosa@example.com"));
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_requires_name_and_valid_email() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_customer(&db, CustomerDetails::default()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidInput { field: "name", .. }
        ));

        let result = create_customer(
            &db,
            CustomerDetails {
                name: "Luis".to_string(),
                email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidInput { field: "email", .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_keeps_registration_date() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_customer(&db, "Marta").await?;

        let updated = update_customer(
            &db,
            created.id,
            CustomerDetails {
                name: "Marta Ruiz".to_string(),
                phone: Some("555-0101".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.name, "Marta Ruiz");
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
        assert_eq!(updated.registered_at, created.registered_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_customers_search() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_customer(&db, "Zoe").await?;
        create_test_customer(&db, "Andrés").await?;
        create_customer(
            &db,
            CustomerDetails {
                name: "Bruno".to_string(),
                phone: Some("555-7788".to_string()),
                email: Some("bruno@mail.test".to_string()),
                notes: None,
            },
        )
        .await?;

        let all = list_customers(&db, None).await?;
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Andrés", "Bruno", "Zoe"]);

        assert_eq!(list_customers(&db, Some("7788")).await?.len(), 1);
        assert_eq!(list_customers(&db, Some("mail.test")).await?.len(), 1);
        assert_eq!(list_customers(&db, Some("  ")).await?.len(), 3);
        assert!(list_customers(&db, Some("nobody")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_customer_keeps_reservations() -> Result<()> {
        let db = setup_test_db().await?;
        let guest = create_test_customer(&db, "Irene").await?;
        let table = create_test_table(&db, 4, 4).await?;
        let mut booking = test_booking(table.id, 2);
        booking.customer_id = Some(guest.id);
        let booked = reservations::create_reservation(&db, booking).await?;

        delete_customer(&db, guest.id).await?;

        assert!(get_customer(&db, guest.id).await?.is_none());
        let kept = reservations::require_reservation(&db, booked.id).await?;
        assert_eq!(kept.customer_id, None);
        assert_eq!(kept.table_id, Some(table.id));
        Ok(())
    }
}
