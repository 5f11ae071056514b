//! Menu pages: items and categories.

use super::{
    AppState,
    auth::Staff,
    forms::{AvailabilityForm, CategoryForm, ItemForm, ListQuery, parse_checkbox},
    response::{FormPage, failure, ok_page, redirect_notice},
};
use crate::{core::menu, errors::Result};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::{Value, json};

const LIST: &str = "/menu";
const CATEGORIES: &str = "/menu/categories";

async fn menu_context(state: &AppState, query: &ListQuery) -> Result<Value> {
    let filter = query.item_filter();
    let items = menu::list_items(&state.db, filter).await?;
    let categories = menu::list_categories(&state.db).await?;
    Ok(json!({
        "items": items,
        "categories": categories,
        "categoria": filter.category_id,
        "disponible": filter.available,
        "notice": query.notice,
        "error": query.error,
    }))
}

/// GET /menu?categoria=&disponible=
pub async fn list_items(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    match menu_context(&state, &query).await {
        Ok(context) => ok_page(&state, "menu/list", &context),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// GET /menu/items/{id}
pub async fn show_item(State(state): State<AppState>, Path(item_id): Path<i64>) -> Response {
    match menu::require_item(&state.db, item_id).await {
        Ok(item) => ok_page(&state, "menu/detail", &json!({ "item": item })),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /menu/items
pub async fn create_item(
    State(state): State<AppState>,
    _staff: Staff,
    Form(form): Form<ItemForm>,
) -> Response {
    let result = match form.to_spec() {
        Ok(spec) => menu::create_item(&state.db, spec).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(created) => redirect_notice(LIST, &format!("{} added to the menu", created.name)),
        Err(e) => failure(&state, e, Some(FormPage::new("menu/form", &form)), LIST),
    }
}

/// POST /menu/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    _staff: Staff,
    Path(item_id): Path<i64>,
    Form(form): Form<ItemForm>,
) -> Response {
    let result = match form.to_spec() {
        Ok(spec) => menu::update_item(&state.db, item_id, spec).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => redirect_notice(LIST, &format!("{} updated", updated.name)),
        Err(e) => failure(&state, e, Some(FormPage::new("menu/form", &form)), LIST),
    }
}

/// POST /menu/items/{id}/availability
pub async fn set_availability(
    State(state): State<AppState>,
    _staff: Staff,
    Path(item_id): Path<i64>,
    Form(form): Form<AvailabilityForm>,
) -> Response {
    let available = parse_checkbox(form.available.as_deref());
    match menu::set_item_availability(&state.db, item_id, available).await {
        Ok(updated) => redirect_notice(
            LIST,
            &format!(
                "{} is {}",
                updated.name,
                if updated.available { "available" } else { "unavailable" }
            ),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /menu/items/{id}/delete
pub async fn delete_item(
    State(state): State<AppState>,
    _staff: Staff,
    Path(item_id): Path<i64>,
) -> Response {
    match menu::delete_item(&state.db, item_id).await {
        Ok(()) => redirect_notice(LIST, "Menu item deleted"),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// GET /menu/categories
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    match menu::list_categories(&state.db).await {
        Ok(categories) => ok_page(
            &state,
            "menu/categories",
            &json!({
                "categories": categories,
                "notice": query.notice,
                "error": query.error,
            }),
        ),
        Err(e) => failure(&state, e, None, LIST),
    }
}

/// POST /menu/categories
pub async fn create_category(
    State(state): State<AppState>,
    _staff: Staff,
    Form(form): Form<CategoryForm>,
) -> Response {
    let result = match form.station() {
        Ok(station) => {
            menu::create_category(&state.db, form.name.clone(), form.description.clone(), station)
                .await
        }
        Err(e) => Err(e),
    };
    match result {
        Ok(created) => redirect_notice(CATEGORIES, &format!("Category {} created", created.name)),
        Err(e) => failure(
            &state,
            e,
            Some(FormPage::new("menu/category_form", &form)),
            CATEGORIES,
        ),
    }
}

/// POST /menu/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    _staff: Staff,
    Path(category_id): Path<i64>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let result = match form.station() {
        Ok(station) => {
            menu::update_category(
                &state.db,
                category_id,
                form.name.clone(),
                form.description.clone(),
                station,
            )
            .await
        }
        Err(e) => Err(e),
    };
    match result {
        Ok(updated) => redirect_notice(CATEGORIES, &format!("Category {} updated", updated.name)),
        Err(e) => failure(
            &state,
            e,
            Some(FormPage::new("menu/category_form", &form)),
            CATEGORIES,
        ),
    }
}

/// POST /menu/categories/{id}/delete
pub async fn delete_category(
    State(state): State<AppState>,
    _staff: Staff,
    Path(category_id): Path<i64>,
) -> Response {
    match menu::delete_category(&state.db, category_id).await {
        Ok(()) => redirect_notice(CATEGORIES, "Category deleted"),
        Err(e) => failure(&state, e, None, CATEGORIES),
    }
}
