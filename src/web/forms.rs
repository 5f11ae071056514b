//! Form input shaping.
//!
//! Submitted forms arrive as loose strings. Each form struct here turns itself into
//! a fully specified command for `core`, reporting the first bad field as
//! `Error::InvalidInput`. Values that depend on the route (the table or customer a
//! booking was started from, the staff member) are passed in explicitly.
//!
//! Form struct fields are named after the HTML inputs they receive.

#![allow(missing_docs)]

use crate::{
    core::{
        customer::CustomerDetails,
        menu::{DEFAULT_PREP_MINUTES, ItemFilter, ItemSpec},
        order::{NewOrder, OrderChanges},
        reservation::{NewReservation, ReservationChanges},
        table::{TableSpec, WalkIn},
    },
    entities::{OrderKind, OrderStatus, Station},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Accepted layouts of a submitted date and time, interpreted as UTC.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Filter values that mean "no filter".
const ALL_FILTER: [&str; 3] = ["todas", "todos", "all"];

fn blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

/// Parses a required integer field.
pub fn parse_int(field: &'static str, raw: &str) -> Result<i32> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid(field, "Enter a whole number"))
}

/// Parses a required record ID.
pub fn parse_id(field: &'static str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid(field, "Select a valid option"))
}

/// Parses an optional record ID; a blank value means none.
pub fn parse_optional_id(field: &'static str, raw: &str) -> Result<Option<i64>> {
    if blank(raw) {
        return Ok(None);
    }
    parse_id(field, raw).map(Some)
}

/// Parses a decimal amount.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid(field, "Enter a number"))
}

/// Parses a `datetime-local` style value.
pub fn parse_datetime(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::invalid(field, "Enter a date and time as YYYY-MM-DDTHH:MM"))
}

/// Parses one of the lowercase names of an enum.
pub fn parse_choice<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| Error::invalid(field, format!("'{raw}' is not a valid choice")))
}

/// Interprets an HTML checkbox.
#[must_use]
pub fn parse_checkbox(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("on" | "true" | "1" | "yes"))
}

/// A status filter such as `estado`, read from a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter<T> {
    /// Blank or `todas`/`todos`/`all`
    Any,
    /// A known status
    Only(T),
    /// A value naming no status; nothing is in it
    Unmatched,
}

impl<T: Copy> StatusFilter<T> {
    /// Status to filter on, if the value named one.
    #[must_use]
    pub fn selected(self) -> Option<T> {
        match self {
            Self::Only(status) => Some(status),
            Self::Any | Self::Unmatched => None,
        }
    }

    /// Whether no record can pass the filter.
    #[must_use]
    pub fn is_unmatched(self) -> bool {
        matches!(self, Self::Unmatched)
    }
}

/// Interprets a status filter. Blank values and `todas`/`todos`/`all` select
/// everything; an unknown value selects nothing.
pub fn status_filter<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> StatusFilter<T> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return StatusFilter::Any;
    };
    if ALL_FILTER.contains(&raw) {
        return StatusFilter::Any;
    }
    parse(raw).map_or(StatusFilter::Unmatched, StatusFilter::Only)
}

/// Interprets the `disponible` filter.
#[must_use]
pub fn availability_filter(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim)? {
        "true" | "1" | "si" | "sí" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Query parameters shared by the list views.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Status filter
    pub estado: Option<String>,
    /// Free-text search
    pub q: Option<String>,
    /// Menu category filter
    pub categoria: Option<String>,
    /// Menu availability filter
    pub disponible: Option<String>,
    /// Success message from a redirect
    pub notice: Option<String>,
    /// Error message from a redirect
    pub error: Option<String>,
}

impl ListQuery {
    /// Menu filter built from `categoria` and `disponible`.
    #[must_use]
    pub fn item_filter(&self) -> ItemFilter {
        ItemFilter {
            category_id: self
                .categoria
                .as_deref()
                .and_then(|c| c.trim().parse().ok()),
            available: availability_filter(self.disponible.as_deref()),
        }
    }
}

/// Table create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TableForm {
    pub number: String,
    pub capacity: String,
    pub location: String,
}

impl TableForm {
    /// Shapes the form into table attributes.
    pub fn to_spec(&self) -> Result<TableSpec> {
        Ok(TableSpec {
            number: parse_int("number", &self.number)?,
            capacity: parse_int("capacity", &self.capacity)?,
            location: parse_choice("location", &self.location)?,
        })
    }
}

/// Walk-in seating form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WalkInForm {
    pub party_size: String,
    pub customer_id: String,
}

impl WalkInForm {
    /// Shapes the form into a walk-in for `table_id`.
    pub fn to_walk_in(&self, table_id: i64, staff: &str) -> Result<WalkIn> {
        Ok(WalkIn {
            table_id,
            party_size: parse_int("party_size", &self.party_size)?,
            customer_id: parse_optional_id("customer_id", &self.customer_id)?,
            created_by: Some(staff.to_string()),
        })
    }
}

/// Customer create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomerForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
}

impl CustomerForm {
    /// Shapes the form into contact details. Blank fields are cleaned up by `core`.
    #[must_use]
    pub fn to_details(&self) -> CustomerDetails {
        CustomerDetails {
            name: self.name.clone(),
            phone: Some(self.phone.clone()),
            email: Some(self.email.clone()),
            notes: Some(self.notes.clone()),
        }
    }
}

/// Reservation create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReservationForm {
    pub customer_id: String,
    pub table_id: String,
    pub scheduled_at: String,
    pub party_size: String,
    pub notes: String,
}

/// Route-provided values that override the form when booking from a table or a
/// customer page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preselected {
    /// Table the booking was started from
    pub table_id: Option<i64>,
    /// Customer the booking was started from
    pub customer_id: Option<i64>,
}

impl ReservationForm {
    /// Shapes the form into a booking request.
    pub fn to_new(&self, preselected: Preselected, staff: &str) -> Result<NewReservation> {
        let customer_id = match preselected.customer_id {
            Some(id) => Some(id),
            None => parse_optional_id("customer_id", &self.customer_id)?,
        };
        let table_id = match preselected.table_id {
            Some(id) => Some(id),
            None => parse_optional_id("table_id", &self.table_id)?,
        };
        Ok(NewReservation {
            customer_id,
            table_id,
            scheduled_at: parse_datetime("scheduled_at", &self.scheduled_at)?,
            party_size: parse_int("party_size", &self.party_size)?,
            notes: self.notes.trim().to_string(),
            created_by: Some(staff.to_string()),
        })
    }

    /// Shapes the form into changes of an existing reservation.
    pub fn to_changes(&self) -> Result<ReservationChanges> {
        Ok(ReservationChanges {
            customer_id: parse_optional_id("customer_id", &self.customer_id)?,
            table_id: parse_optional_id("table_id", &self.table_id)?,
            scheduled_at: parse_datetime("scheduled_at", &self.scheduled_at)?,
            party_size: parse_int("party_size", &self.party_size)?,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Order create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderForm {
    pub table_id: String,
    pub customer_id: String,
    pub kind: String,
    pub status: String,
    pub notes: String,
}

impl OrderForm {
    fn kind(&self) -> Result<OrderKind> {
        if blank(&self.kind) {
            return Ok(OrderKind::DineIn);
        }
        parse_choice("kind", &self.kind)
    }

    /// Shapes the form into a manual order.
    pub fn to_new(&self, staff: &str) -> Result<NewOrder> {
        Ok(NewOrder {
            table_id: parse_optional_id("table_id", &self.table_id)?,
            customer_id: parse_optional_id("customer_id", &self.customer_id)?,
            kind: self.kind()?,
            notes: self.notes.trim().to_string(),
            handled_by: Some(staff.to_string()),
        })
    }

    /// Shapes the form into changes of an existing order.
    pub fn to_changes(&self) -> Result<OrderChanges> {
        Ok(OrderChanges {
            table_id: parse_optional_id("table_id", &self.table_id)?,
            customer_id: parse_optional_id("customer_id", &self.customer_id)?,
            kind: self.kind()?,
            status: parse_choice::<OrderStatus>("status", &self.status)?,
            notes: self.notes.trim().to_string(),
        })
    }
}

/// Order status change.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusForm {
    pub status: String,
}

/// Order line add/edit/remove form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LineForm {
    pub menu_item_id: String,
    pub quantity: String,
    pub notes: String,
}

impl LineForm {
    /// Selected menu item.
    pub fn item_id(&self) -> Result<i64> {
        parse_id("menu_item_id", &self.menu_item_id)
    }

    /// Quantity; a blank field means one.
    pub fn quantity(&self) -> Result<i32> {
        if blank(&self.quantity) {
            return Ok(1);
        }
        parse_int("quantity", &self.quantity)
    }
}

/// Discount form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscountForm {
    pub percent: String,
}

/// Menu item create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ItemForm {
    pub name: String,
    pub description: String,
    pub category_id: String,
    pub price: String,
    pub available: Option<String>,
    pub prep_minutes: String,
}

impl ItemForm {
    /// Shapes the form into item attributes.
    pub fn to_spec(&self) -> Result<ItemSpec> {
        let prep_minutes = if blank(&self.prep_minutes) {
            DEFAULT_PREP_MINUTES
        } else {
            parse_int("prep_minutes", &self.prep_minutes)?
        };
        Ok(ItemSpec {
            name: self.name.clone(),
            description: self.description.trim().to_string(),
            category_id: parse_optional_id("category_id", &self.category_id)?,
            price: parse_decimal("price", &self.price)?,
            available: parse_checkbox(self.available.as_deref()),
            prep_minutes,
        })
    }
}

/// Availability toggle.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AvailabilityForm {
    pub available: Option<String>,
}

/// Menu category create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub station: String,
}

impl CategoryForm {
    /// Preparing station; a blank field means the kitchen.
    pub fn station(&self) -> Result<Station> {
        if blank(&self.station) {
            return Ok(Station::Kitchen);
        }
        parse_choice("station", &self.station)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Location, ReservationStatus, TableStatus};
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_datetime_formats() {
        let parsed = parse_datetime("scheduled_at", "2026-11-02T20:30").unwrap();
        assert_eq!((parsed.month(), parsed.day()), (11, 2));
        assert_eq!((parsed.hour(), parsed.minute()), (20, 30));
        assert!(parse_datetime("scheduled_at", "2026-11-02 20:30").is_ok());

        let err = parse_datetime("scheduled_at", "tomorrow").unwrap_err();
        assert_eq!(err.field(), Some("scheduled_at"));
    }

    #[test]
    fn test_status_filter_all_values() {
        for raw in [None, Some(""), Some("todas"), Some("todos"), Some("all")] {
            assert_eq!(status_filter(raw, TableStatus::parse), StatusFilter::Any);
        }
        assert_eq!(
            status_filter(Some("reserved"), TableStatus::parse),
            StatusFilter::Only(TableStatus::Reserved)
        );
        assert_eq!(
            status_filter(Some("no_show"), ReservationStatus::parse),
            StatusFilter::Only(ReservationStatus::NoShow)
        );

        let unknown = status_filter(Some("bogus"), TableStatus::parse);
        assert_eq!(unknown, StatusFilter::Unmatched);
        assert!(unknown.is_unmatched());
        assert_eq!(unknown.selected(), None);
    }

    #[test]
    fn test_availability_filter() {
        assert_eq!(availability_filter(Some("true")), Some(true));
        assert_eq!(availability_filter(Some("false")), Some(false));
        assert_eq!(availability_filter(Some("")), None);
        assert_eq!(availability_filter(None), None);
    }

    #[test]
    fn test_table_form_shaping() {
        let form = TableForm {
            number: "5".to_string(),
            capacity: " 4 ".to_string(),
            location: "terrace".to_string(),
        };
        let spec = form.to_spec().unwrap();
        assert_eq!(spec.capacity, 4);
        assert_eq!(spec.location, Location::Terrace);

        let bad = TableForm {
            location: "roof".to_string(),
            ..form
        };
        assert_eq!(bad.to_spec().unwrap_err().field(), Some("location"));
    }

    #[test]
    fn test_preselected_table_overrides_form() {
        let form = ReservationForm {
            customer_id: String::new(),
            table_id: "3".to_string(),
            scheduled_at: "2030-01-01T19:00".to_string(),
            party_size: "2".to_string(),
            notes: " window ".to_string(),
        };
        let booking = form
            .to_new(
                Preselected {
                    table_id: Some(8),
                    customer_id: None,
                },
                "ana",
            )
            .unwrap();
        assert_eq!(booking.table_id, Some(8));
        assert_eq!(booking.customer_id, None);
        assert_eq!(booking.notes, "window");
        assert_eq!(booking.created_by.as_deref(), Some("ana"));
    }

    #[test]
    fn test_item_form_defaults() {
        let form = ItemForm {
            name: "Pisco sour".to_string(),
            price: "18.50".to_string(),
            available: Some("on".to_string()),
            ..Default::default()
        };
        let spec = form.to_spec().unwrap();
        assert!(spec.available);
        assert_eq!(spec.prep_minutes, DEFAULT_PREP_MINUTES);
        assert_eq!(spec.price, Decimal::new(1850, 2));

        let line = LineForm {
            menu_item_id: "4".to_string(),
            ..Default::default()
        };
        assert_eq!(line.quantity().unwrap(), 1);
    }
}
