//! Customer pages.

use super::{
    AppState,
    auth::Staff,
    forms::{CustomerForm, ListQuery, Preselected, ReservationForm},
    response::{FormPage, failure, ok_page, redirect_notice},
};
use crate::core::{customer, reservation};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::json;

const LIST: &str = "/customers";

/// GET /customers?q=
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match customer::list_customers(&state.db, query.q.as_deref()).await {
        Ok(customers) => ok_page(
            &state,
            "customers/list",
            &json!({
                "customers": customers,
                "q": query.q,
                "notice": query.notice,
                "error": query.error,
            }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// GET /customers/{id}
pub async fn show_customer(State(state): State<AppState>, Path(customer_id): Path<i64>) -> Response {
    let found = match customer::require_customer(&state.db, customer_id).await {
        Ok(found) => found,
        Err(e) => return failure(&state, e, None, LIST),
    };
    match reservation::list_for_customer(&state.db, customer_id).await {
        Ok(reservations) => ok_page(
            &state,
            "customers/detail",
            &json!({ "customer": found, "reservations": reservations }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /customers
pub async fn create_customer(
    State(state): State<AppState>,
    _staff: Staff,
    Form(form): Form<CustomerForm>,
) -> Response {
    match customer::create_customer(&state.db, form.to_details()).await {
        Ok(created) => redirect_notice(LIST, &format!("Customer {} registered", created.name)),
        Err(e) => failure(&state, e, Some(FormPage::new("customers/form", &form)), LIST),
    }
}

/// POST /customers/{id}
pub async fn update_customer(
    State(state): State<AppState>,
    _staff: Staff,
    Path(customer_id): Path<i64>,
    Form(form): Form<CustomerForm>,
) -> Response {
    match customer::update_customer(&state.db, customer_id, form.to_details()).await {
        Ok(updated) => redirect_notice(
            &format!("/customers/{customer_id}"),
            &format!("Customer {} updated", updated.name),
        ),
        Err(e) => failure(&state, e, Some(FormPage::new("customers/form", &form)), LIST),
    }
}

/// POST /customers/{id}/delete
pub async fn delete_customer(
    State(state): State<AppState>,
    _staff: Staff,
    Path(customer_id): Path<i64>,
) -> Response {
    match customer::delete_customer(&state.db, customer_id).await {
        Ok(()) => redirect_notice(LIST, "Customer deleted"),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /customers/{id}/reserve
///
/// Books a table for this customer; the customer field of the form is ignored.
pub async fn reserve_for_customer(
    State(state): State<AppState>,
    staff: Staff,
    Path(customer_id): Path<i64>,
    Form(form): Form<ReservationForm>,
) -> Response {
    let preselected = Preselected {
        table_id: None,
        customer_id: Some(customer_id),
    };
    let result = match form.to_new(preselected, &staff.name) {
        Ok(booking) => reservation::create_reservation(&state.db, booking).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => redirect_notice(&format!("/customers/{customer_id}"), "Reservation created"),
        Err(e) => {
            let mut page = FormPage::new("reservations/form", &form);
            page.context["customer_id"] = json!(customer_id);
            failure(&state, e, Some(page), LIST)
        }
    }
}
