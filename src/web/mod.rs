//! HTTP interface.
//!
//! An axum router over the `core` operations. Read-only views are public; every
//! write takes a [`auth::Staff`] extractor and therefore needs a valid session.
//! Handlers shape form input into commands (see [`forms`]) and map the outcome to
//! a rendered view or a redirect carrying a notice (see [`response`]).

pub mod auth;
pub mod customers;
pub mod forms;
pub mod menu;
pub mod orders;
pub mod reservations;
pub mod response;
pub mod tables;
pub mod view;

use auth::Authenticator;
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use view::ViewRenderer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Session authentication for write operations
    pub authenticator: Arc<dyn Authenticator>,
    /// View rendering
    pub renderer: Arc<dyn ViewRenderer>,
}

/// Builds the router with every route registered (no middleware).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(tables::list_tables))
        // Tables
        .route("/tables", get(tables::list_tables).post(tables::create_table))
        .route("/tables/{id}", get(tables::show_table).post(tables::update_table))
        .route("/tables/{id}/delete", post(tables::delete_table))
        .route(
            "/tables/{id}/reserve",
            get(tables::reserve_form).post(tables::reserve_table),
        )
        .route("/tables/{id}/check-in", post(tables::check_in))
        .route("/tables/{id}/walk-in", post(tables::seat_walk_in))
        .route("/tables/{id}/release", post(tables::release_table))
        .route("/tables/{id}/maintenance", post(tables::set_maintenance))
        .route(
            "/tables/{id}/maintenance/clear",
            post(tables::clear_maintenance),
        )
        .route("/tables/{id}/order", post(tables::order_for_table))
        // Customers
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/{id}",
            get(customers::show_customer).post(customers::update_customer),
        )
        .route("/customers/{id}/delete", post(customers::delete_customer))
        .route(
            "/customers/{id}/reserve",
            post(customers::reserve_for_customer),
        )
        // Reservations
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(reservations::show_reservation).post(reservations::update_reservation),
        )
        .route("/reservations/{id}/confirm", post(reservations::confirm))
        .route("/reservations/{id}/check-in", post(reservations::check_in))
        .route("/reservations/{id}/cancel", post(reservations::cancel))
        .route("/reservations/{id}/complete", post(reservations::complete))
        .route("/reservations/{id}/no-show", post(reservations::no_show))
        .route("/reservations/{id}/delete", post(reservations::delete))
        // Orders
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/{id}", get(orders::show_order).post(orders::update_order))
        .route("/orders/{id}/status", post(orders::set_status))
        .route("/orders/{id}/delete", post(orders::delete_order))
        .route("/orders/{id}/lines", post(orders::add_line))
        .route("/orders/{id}/lines/update", post(orders::update_line))
        .route("/orders/{id}/lines/remove", post(orders::remove_line))
        .route("/orders/{id}/discount", post(orders::apply_discount))
        // Menu
        .route("/menu", get(menu::list_items))
        .route("/menu/items", post(menu::create_item))
        .route("/menu/items/{id}", get(menu::show_item).post(menu::update_item))
        .route(
            "/menu/items/{id}/availability",
            post(menu::set_availability),
        )
        .route("/menu/items/{id}/delete", post(menu::delete_item))
        .route(
            "/menu/categories",
            get(menu::list_categories).post(menu::create_category),
        )
        .route("/menu/categories/{id}", post(menu::update_category))
        .route(
            "/menu/categories/{id}/delete",
            post(menu::delete_category),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::seed::StaffConfig,
        core::{order, reservation, table},
        entities::{ReservationStatus, TableStatus},
        errors::Result,
        test_utils::*,
    };
    use auth::StaffSessions;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;
    use view::JsonRenderer;

    const TOKEN: &str = "tok-ana";

    fn app(db: &DatabaseConnection) -> Router {
        let sessions = StaffSessions::from_config(&[StaffConfig {
            name: "ana".to_string(),
            session_token: TOKEN.to_string(),
        }]);
        build_router(AppState {
            db: db.clone(),
            authenticator: Arc::new(sessions),
            renderer: Arc::new(JsonRenderer),
        })
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(app: Router, uri: &str, body: &str, token: Option<&str>) -> Response {
        let mut request = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("session={token}"));
        }
        app.oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn form_time(offset: Duration) -> String {
        (Utc::now() + offset).format("%Y-%m-%dT%H:%M").to_string()
    }

    #[tokio::test]
    async fn test_list_views_are_public() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_table(&db, 5, 4).await?;

        let response = get(app(&db), "/tables?estado=todas").await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert_eq!(doc["template"], "tables/list");
        assert_eq!(doc["context"]["tables"].as_array().unwrap().len(), 1);

        let response = get(app(&db), "/tables?estado=reserved").await;
        let doc = json_body(response).await;
        assert!(doc["context"]["tables"].as_array().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_filter_lists_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let t = create_test_table(&db, 5, 4).await?;
        let booked = reservation::create_reservation(&db, test_booking(t.id, 2)).await?;
        assert_eq!(booked.status, ReservationStatus::Pending);

        let response = get(app(&db), "/tables?estado=libre").await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["context"]["tables"].as_array().unwrap().is_empty());

        let response = get(app(&db), "/reservations?estado=bogus").await;
        let doc = json_body(response).await;
        assert!(doc["context"]["reservations"].as_array().unwrap().is_empty());

        let response = get(app(&db), "/reservations?estado=pending").await;
        let doc = json_body(response).await;
        assert_eq!(doc["context"]["reservations"].as_array().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_writes_require_session() -> Result<()> {
        let db = setup_test_db().await?;

        let response = post_form(app(&db), "/tables", "number=1&capacity=4&location=bar", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = post_form(
            app(&db),
            "/tables",
            "number=1&capacity=4&location=bar",
            Some("wrong"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(table::list_tables(&db, None).await?.is_empty());

        let response = post_form(
            app(&db),
            "/tables",
            "number=1&capacity=4&location=bar",
            Some(TOKEN),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/tables?notice="));
        assert_eq!(table::list_tables(&db, None).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_booking_from_table_page() -> Result<()> {
        let db = setup_test_db().await?;
        let t5 = create_test_table(&db, 5, 4).await?;
        let when = form_time(Duration::days(2));

        let response = post_form(
            app(&db),
            &format!("/tables/{}/reserve", t5.id),
            &format!("scheduled_at={when}&party_size=4&table_id=999"),
            Some(TOKEN),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let booked = reservation::list_for_table(&db, t5.id).await?;
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].created_by.as_deref(), Some("ana"));
        assert_eq!(
            table::require_table(&db, t5.id).await?.status,
            TableStatus::Reserved
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_error_rerenders_form() -> Result<()> {
        let db = setup_test_db().await?;
        let t5 = create_test_table(&db, 5, 4).await?;
        let when = form_time(Duration::days(2));

        let response = post_form(
            app(&db),
            "/reservations",
            &format!("table_id={}&scheduled_at={when}&party_size=6", t5.id),
            Some(TOKEN),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let doc = json_body(response).await;
        assert_eq!(doc["template"], "reservations/form");
        assert_eq!(doc["context"]["values"]["party_size"], "6");
        assert!(doc["context"]["errors"]["party_size"].is_string());
        assert!(reservation::list_reservations(&db, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_business_rule_redirects_with_error() -> Result<()> {
        let db = setup_test_db().await?;
        let t5 = create_test_table(&db, 5, 4).await?;

        let response = post_form(
            app(&db),
            &format!("/tables/{}/order", t5.id),
            "",
            Some(TOKEN),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("/tables?error="));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let response = get(app(&db), "/reservations/42").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let doc = json_body(response).await;
        assert_eq!(doc["template"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn test_order_flow_over_http() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, seated) = setup_seated_table(&db, 4).await?;
        let item = create_test_item(&db, "Lomo saltado", 12500).await?;

        let response = post_form(app(&db), &format!("/tables/{}/order", t.id), "", Some(TOKEN)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let placed = order::active_order_for_table(&db, t.id).await?.unwrap();
        assert!(location(&response).starts_with(&format!("/orders/{}", placed.id)));

        let lines = format!("/orders/{}/lines", placed.id);
        post_form(
            app(&db),
            &lines,
            &format!("menu_item_id={}&quantity=2", item.id),
            Some(TOKEN),
        )
        .await;
        assert_eq!(order::require_order(&db, placed.id).await?.total, Decimal::from(25000));

        post_form(
            app(&db),
            &format!("{lines}/update"),
            &format!("menu_item_id={}&quantity=3", item.id),
            Some(TOKEN),
        )
        .await;
        assert_eq!(order::require_order(&db, placed.id).await?.total, Decimal::from(37500));

        post_form(
            app(&db),
            &format!("{lines}/remove"),
            &format!("menu_item_id={}", item.id),
            Some(TOKEN),
        )
        .await;
        assert_eq!(order::require_order(&db, placed.id).await?.total, Decimal::ZERO);

        let response = get(app(&db), &format!("/orders/{}", placed.id)).await;
        let doc = json_body(response).await;
        assert_eq!(doc["context"]["order"]["id"], placed.id);
        assert_eq!(
            reservation::require_reservation(&db, seated.id).await?.status,
            ReservationStatus::InProgress
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_item_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let (t, _) = setup_seated_table(&db, 4).await?;
        let placed = order::create_for_table(&db, t.id, None).await?;
        let item = create_test_item(&db, "Chupe", 9000).await?;
        crate::core::menu::set_item_availability(&db, item.id, false).await?;

        let response = post_form(
            app(&db),
            &format!("/orders/{}/lines", placed.order.id),
            &format!("menu_item_id={}", item.id),
            Some(TOKEN),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let doc = json_body(response).await;
        assert!(doc["context"]["errors"]["menu_item_id"].is_string());
        assert_eq!(
            order::require_order(&db, placed.order.id).await?.total,
            Decimal::ZERO
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_search_and_menu_filters() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_customer(&db, "Rosa").await?;
        create_test_customer(&db, "Luis").await?;
        let item = create_test_item(&db, "Chicha", 4000).await?;
        create_test_item(&db, "Causa", 7000).await?;
        crate::core::menu::set_item_availability(&db, item.id, false).await?;

        let doc = json_body(get(app(&db), "/customers?q=ros").await).await;
        assert_eq!(doc["context"]["customers"].as_array().unwrap().len(), 1);

        let doc = json_body(get(app(&db), "/menu?disponible=false").await).await;
        let items = doc["context"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Chicha");
        Ok(())
    }
}
