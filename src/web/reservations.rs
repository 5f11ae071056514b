//! Reservation pages and lifecycle actions.

use super::{
    AppState,
    auth::Staff,
    forms::{ListQuery, Preselected, ReservationForm, status_filter},
    response::{FormPage, failure, ok_page, redirect_notice},
};
use crate::{
    core::reservation,
    entities::{ReservationModel, ReservationStatus},
    errors::Result,
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::json;

const LIST: &str = "/reservations";

/// GET /reservations?estado=
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let filter = status_filter(query.estado.as_deref(), ReservationStatus::parse);
    let status = filter.selected();
    let listed = if filter.is_unmatched() {
        Ok(Vec::new())
    } else {
        reservation::list_reservations(&state.db, status).await
    };
    match listed {
        Ok(reservations) => ok_page(
            &state,
            "reservations/list",
            &json!({
                "reservations": reservations,
                "estado": status.map(ReservationStatus::as_str),
                "notice": query.notice,
                "error": query.error,
            }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// GET /reservations/{id}
pub async fn show_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<i64>,
) -> Response {
    match reservation::require_reservation(&state.db, reservation_id).await {
        Ok(found) => ok_page(&state, "reservations/detail", &json!({ "reservation": found })),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    staff: Staff,
    Form(form): Form<ReservationForm>,
) -> Response {
    let result = match form.to_new(Preselected::default(), &staff.name) {
        Ok(booking) => reservation::create_reservation(&state.db, booking).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(created) => redirect_notice(
            LIST,
            &format!("Reservation {} created", created.id),
        ),
        Err(e) => failure(&state, e, Some(FormPage::new("reservations/form", &form)), LIST),
    }
}

/// POST /reservations/{id}
pub async fn update_reservation(
    State(state): State<AppState>,
    _staff: Staff,
    Path(reservation_id): Path<i64>,
    Form(form): Form<ReservationForm>,
) -> Response {
    let result = match form.to_changes() {
        Ok(changes) => reservation::update_reservation(&state.db, reservation_id, changes).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => redirect_notice(LIST, "Reservation updated"),
        Err(e) => {
            let mut page = FormPage::new("reservations/form", &form);
            page.context["reservation_id"] = json!(reservation_id);
            failure(&state, e, Some(page), LIST)
        }
    }
}

fn after_transition(
    state: &AppState,
    result: Result<ReservationModel>,
    verb: &str,
) -> Response {
    match result {
        Ok(updated) => redirect_notice(LIST, &format!("Reservation {} {verb}", updated.id)),
        Err(e) => failure(state, e, None, LIST),
    }
}

/// POST /reservations/{id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> Response {
    let result = reservation::confirm_reservation(&state.db, id).await;
    after_transition(&state, result, "confirmed")
}

/// POST /reservations/{id}/check-in
pub async fn check_in(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> Response {
    let result = reservation::check_in(&state.db, id).await;
    after_transition(&state, result, "checked in")
}

/// POST /reservations/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> Response {
    let result = reservation::cancel_reservation(&state.db, id).await;
    after_transition(&state, result, "cancelled")
}

/// POST /reservations/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> Response {
    let result = reservation::complete_reservation(&state.db, id).await;
    after_transition(&state, result, "completed")
}

/// POST /reservations/{id}/no-show
pub async fn no_show(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> Response {
    let result = reservation::mark_no_show(&state.db, id).await;
    after_transition(&state, result, "marked as no-show")
}

/// POST /reservations/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    _staff: Staff,
    Path(id): Path<i64>,
) -> Response {
    match reservation::delete_reservation(&state.db, id).await {
        Ok(()) => redirect_notice(LIST, "Reservation deleted"),
        Err(e) => failure(&state, e, None, LIST),
    }
}
