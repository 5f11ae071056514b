//! Order pages: orders, their lines and discounts.
//!
//! Only available menu items can be put on an order; the check happens here when
//! the submitted item is looked up, before `core::order` sees it.

use super::{
    AppState,
    auth::Staff,
    forms::{
        DiscountForm, LineForm, ListQuery, OrderForm, StatusForm, parse_choice, parse_decimal,
        status_filter,
    },
    response::{FormPage, failure, ok_page, redirect_notice},
};
use crate::{
    core::{menu, order},
    entities::OrderStatus,
    errors::Result,
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::{Value, json};

const LIST: &str = "/orders";

fn detail_path(order_id: i64) -> String {
    format!("/orders/{order_id}")
}

/// GET /orders?estado=
pub async fn list_orders(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let filter = status_filter(query.estado.as_deref(), OrderStatus::parse);
    let status = filter.selected();
    let listed = if filter.is_unmatched() {
        Ok(Vec::new())
    } else {
        order::list_orders(&state.db, status).await
    };
    match listed {
        Ok(orders) => ok_page(
            &state,
            "orders/list",
            &json!({
                "orders": orders,
                "estado": status.map(OrderStatus::as_str),
                "notice": query.notice,
                "error": query.error,
            }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

async fn detail_context(state: &AppState, order_id: i64) -> Result<Value> {
    let (found, lines) = order::get_order_with_lines(&state.db, order_id).await?;
    let menu = menu::available_items(&state.db).await?;
    Ok(json!({ "order": found, "lines": lines, "menu": menu }))
}

/// GET /orders/{id}
pub async fn show_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Response {
    match detail_context(&state, order_id).await {
        Ok(mut context) => {
            context["notice"] = json!(query.notice);
            context["error"] = json!(query.error);
            ok_page(&state, "orders/detail", &context)
        }
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /orders
pub async fn create_order(
    State(state): State<AppState>,
    staff: Staff,
    Form(form): Form<OrderForm>,
) -> Response {
    let result = match form.to_new(&staff.name) {
        Ok(new) => order::create_order(&state.db, new).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(created) => redirect_notice(&detail_path(created.id), "Order created"),
        Err(e) => failure(&state, e, Some(FormPage::new("orders/form", &form)), LIST),
    }
}

/// POST /orders/{id}
pub async fn update_order(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
    Form(form): Form<OrderForm>,
) -> Response {
    let result = match form.to_changes() {
        Ok(changes) => order::update_order(&state.db, order_id, changes).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => redirect_notice(&detail_path(order_id), "Order updated"),
        Err(e) => failure(&state, e, Some(FormPage::new("orders/form", &form)), LIST),
    }
}

/// POST /orders/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Response {
    let result = match parse_choice::<OrderStatus>("status", &form.status) {
        Ok(status) => order::set_order_status(&state.db, order_id, status).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => redirect_notice(
            &detail_path(order_id),
            &format!("Order is now {}", updated.status),
        ),
        Err(e) => failure(&state, e, None, &detail_path(order_id)),
    }
}

/// POST /orders/{id}/delete
pub async fn delete_order(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
) -> Response {
    match order::delete_order(&state.db, order_id).await {
        Ok(()) => redirect_notice(LIST, "Order deleted"),
        Err(e) => failure(&state, e, None, LIST),
    }
}

async fn line_form_page(state: &AppState, order_id: i64, form: &LineForm) -> FormPage {
    let mut page = FormPage::new("orders/line_form", form);
    page.context["order_id"] = json!(order_id);
    if let Ok(menu) = menu::available_items(&state.db).await {
        page.context["menu"] = json!(menu);
    }
    page
}

/// POST /orders/{id}/lines
pub async fn add_line(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
    Form(form): Form<LineForm>,
) -> Response {
    let result = async {
        let item_id = form.item_id()?;
        let quantity = form.quantity()?;
        let item = menu::get_available_item(&state.db, item_id).await?;
        order::add_line(&state.db, order_id, &item, quantity, form.notes.trim().to_string()).await
    }
    .await;
    match result {
        Ok(line) => redirect_notice(
            &detail_path(order_id),
            &format!("Added {} item(s)", line.quantity),
        ),
        Err(e) => {
            let page = line_form_page(&state, order_id, &form).await;
            failure(&state, e, Some(page), &detail_path(order_id))
        }
    }
}

/// POST /orders/{id}/lines/update
pub async fn update_line(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
    Form(form): Form<LineForm>,
) -> Response {
    let result = async {
        let item_id = form.item_id()?;
        let quantity = form.quantity()?;
        let item = menu::require_item(&state.db, item_id).await?;
        order::update_line(&state.db, order_id, &item, quantity).await
    }
    .await;
    match result {
        Ok(_) => redirect_notice(&detail_path(order_id), "Line updated"),
        Err(e) => {
            let page = line_form_page(&state, order_id, &form).await;
            failure(&state, e, Some(page), &detail_path(order_id))
        }
    }
}

/// POST /orders/{id}/lines/remove
pub async fn remove_line(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
    Form(form): Form<LineForm>,
) -> Response {
    let result = match form.item_id() {
        Ok(item_id) => order::remove_line(&state.db, order_id, item_id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(true) => redirect_notice(&detail_path(order_id), "Line removed"),
        Ok(false) => redirect_notice(&detail_path(order_id), "The order has no such item"),
        Err(e) => failure(&state, e, None, &detail_path(order_id)),
    }
}

/// POST /orders/{id}/discount
pub async fn apply_discount(
    State(state): State<AppState>,
    _staff: Staff,
    Path(order_id): Path<i64>,
    Form(form): Form<DiscountForm>,
) -> Response {
    let result = match parse_decimal("percent", &form.percent) {
        Ok(percent) => order::apply_discount(&state.db, order_id, percent).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(total) => redirect_notice(
            &detail_path(order_id),
            &format!("Discount applied, total {total}"),
        ),
        Err(e) => {
            let mut page = FormPage::new("orders/discount_form", &form);
            page.context["order_id"] = json!(order_id);
            failure(&state, e, Some(page), &detail_path(order_id))
        }
    }
}
