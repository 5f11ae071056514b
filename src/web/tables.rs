//! Table pages: floor overview, table detail and the front-of-house actions
//! (booking from a table, check-in, walk-in, release, maintenance, ordering).

use super::{
    AppState,
    auth::Staff,
    forms::{ListQuery, Preselected, ReservationForm, TableForm, WalkInForm, status_filter},
    response::{FormPage, failure, ok_page, redirect_notice},
};
use crate::{
    core::{order, reservation, table},
    entities::TableStatus,
    errors::Result,
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::{Value, json};

const LIST: &str = "/tables";

fn detail_path(table_id: i64) -> String {
    format!("/tables/{table_id}")
}

/// GET /tables?estado=
pub async fn list_tables(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let filter = status_filter(query.estado.as_deref(), TableStatus::parse);
    let status = filter.selected();
    let listed = if filter.is_unmatched() {
        Ok(Vec::new())
    } else {
        table::list_tables(&state.db, status).await
    };
    match listed {
        Ok(tables) => ok_page(
            &state,
            "tables/list",
            &json!({
                "tables": tables,
                "estado": status.map(TableStatus::as_str),
                "notice": query.notice,
                "error": query.error,
            }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

async fn detail_context(state: &AppState, table_id: i64) -> Result<Value> {
    let found = table::require_table(&state.db, table_id).await?;
    let reservations = reservation::list_for_table(&state.db, table_id).await?;
    let active_order = order::active_order_for_table(&state.db, table_id).await?;
    let active_reservations = table::active_reservation_count(&state.db, table_id).await?;
    Ok(json!({
        "table": found,
        "reservations": reservations,
        "active_order": active_order,
        "active_reservations": active_reservations,
    }))
}

/// GET /tables/{id}
pub async fn show_table(
    State(state): State<AppState>,
    Path(table_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Response {
    match detail_context(&state, table_id).await {
        Ok(mut context) => {
            context["notice"] = json!(query.notice);
            context["error"] = json!(query.error);
            ok_page(&state, "tables/detail", &context)
        }
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /tables
pub async fn create_table(
    State(state): State<AppState>,
    _staff: Staff,
    Form(form): Form<TableForm>,
) -> Response {
    let result = match form.to_spec() {
        Ok(spec) => table::create_table(&state.db, spec).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(created) => redirect_notice(LIST, &format!("Table {} created", created.number)),
        Err(e) => failure(&state, e, Some(FormPage::new("tables/form", &form)), LIST),
    }
}

/// POST /tables/{id}
pub async fn update_table(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
    Form(form): Form<TableForm>,
) -> Response {
    let result = match form.to_spec() {
        Ok(spec) => table::update_table(&state.db, table_id, spec).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => redirect_notice(
            &detail_path(table_id),
            &format!("Table {} updated", updated.number),
        ),
        Err(e) => failure(&state, e, Some(FormPage::new("tables/form", &form)), LIST),
    }
}

/// POST /tables/{id}/delete
pub async fn delete_table(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match table::delete_table(&state.db, table_id).await {
        Ok(()) => redirect_notice(LIST, "Table deleted"),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// GET /tables/{id}/reserve
///
/// Booking form with the table already chosen.
pub async fn reserve_form(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match table::require_table(&state.db, table_id).await {
        Ok(found) => ok_page(
            &state,
            "reservations/form",
            &json!({ "table": found, "values": ReservationForm::default() }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /tables/{id}/reserve
pub async fn reserve_table(
    State(state): State<AppState>,
    staff: Staff,
    Path(table_id): Path<i64>,
    Form(form): Form<ReservationForm>,
) -> Response {
    let preselected = Preselected {
        table_id: Some(table_id),
        customer_id: None,
    };
    let result = match form.to_new(preselected, &staff.name) {
        Ok(booking) => reservation::create_reservation(&state.db, booking).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => redirect_notice(&detail_path(table_id), "Reservation created"),
        Err(e) => {
            let mut page = FormPage::new("reservations/form", &form);
            page.context["table_id"] = json!(table_id);
            failure(&state, e, Some(page), LIST)
        }
    }
}

/// POST /tables/{id}/check-in
pub async fn check_in(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match reservation::check_in_table(&state.db, table_id).await {
        Ok(seated) => redirect_notice(
            &detail_path(table_id),
            &format!("Party of {} checked in", seated.party_size),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /tables/{id}/walk-in
pub async fn seat_walk_in(
    State(state): State<AppState>,
    staff: Staff,
    Path(table_id): Path<i64>,
    Form(form): Form<WalkInForm>,
) -> Response {
    let result = match form.to_walk_in(table_id, &staff.name) {
        Ok(walk_in) => table::seat_walk_in(&state.db, walk_in).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(seated) => redirect_notice(
            &detail_path(table_id),
            &format!("Walk-in party of {} seated", seated.party_size),
        ),
        Err(e) => failure(&state, e, Some(FormPage::new("tables/walk_in", &form)), LIST),
    }
}

/// POST /tables/{id}/release
pub async fn release_table(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match table::release_table(&state.db, table_id).await {
        Ok(released) => redirect_notice(LIST, &format!("Table {} released", released.number)),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /tables/{id}/maintenance
pub async fn set_maintenance(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match table::set_maintenance(&state.db, table_id).await {
        Ok(updated) => redirect_notice(
            LIST,
            &format!("Table {} is under maintenance", updated.number),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /tables/{id}/maintenance/clear
pub async fn clear_maintenance(
    State(state): State<AppState>,
    _staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match table::clear_maintenance(&state.db, table_id).await {
        Ok(updated) => redirect_notice(
            LIST,
            &format!("Table {} is back in service ({})", updated.number, updated.status),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /tables/{id}/order
///
/// Opens (or reopens) the order of the party seated at the table.
pub async fn order_for_table(
    State(state): State<AppState>,
    staff: Staff,
    Path(table_id): Path<i64>,
) -> Response {
    match order::create_for_table(&state.db, table_id, Some(staff.name)).await {
        Ok(placed) => {
            let message = if placed.created {
                "Order opened"
            } else {
                "Table already has an open order"
            };
            redirect_notice(&format!("/orders/{}", placed.order.id), message)
        }
        Err(e) => failure(&state, e, None, LIST),
    }
}
