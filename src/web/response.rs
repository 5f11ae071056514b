//! Mapping of outcomes to HTTP responses.
//!
//! Successful writes redirect to a view with a `?notice=` message. Failures are
//! surfaced according to their [`ErrorClass`]:
//! validation errors re-render the submitted form (422) with the message under the
//! offending field, missing records give a not-found page, business-rule
//! violations redirect back to the list view with `?error=`, and internal errors
//! are logged and answered with 500.

use super::{AppState, view};
use crate::errors::{Error, ErrorClass};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{Map, Value, json};
use tracing::{error, warn};

/// Form to re-render when a submission fails validation.
#[derive(Debug, Clone)]
pub struct FormPage {
    /// Template of the form
    pub template: &'static str,
    /// Submitted values plus any context the form needs
    pub context: Value,
}

impl FormPage {
    /// Builds a form page from the submitted values.
    pub fn new(template: &'static str, values: impl serde::Serialize) -> Self {
        Self {
            template,
            context: json!({ "values": values }),
        }
    }
}

fn with_query(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(message))
}

/// Redirects to `path` carrying a success notice.
pub fn redirect_notice(path: &str, message: &str) -> Response {
    Redirect::to(&with_query(path, "notice", message)).into_response()
}

/// Redirects to `path` carrying an error notice.
pub fn redirect_error(path: &str, message: &str) -> Response {
    Redirect::to(&with_query(path, "error", message)).into_response()
}

/// Renders a view with status 200.
pub fn ok_page(state: &AppState, template: &str, context: &Value) -> Response {
    view::page(state.renderer.as_ref(), StatusCode::OK, template, context)
}

/// Turns a failed operation into a response.
///
/// `form` is re-rendered for validation failures; without one they fall back to a
/// redirect to `list_path`, as do business-rule violations.
pub fn failure(state: &AppState, err: Error, form: Option<FormPage>, list_path: &str) -> Response {
    match err.class() {
        ErrorClass::Validation => match form {
            Some(form) => {
                let field = err.field().unwrap_or("__all__");
                let mut errors = Map::new();
                errors.insert(field.to_string(), Value::String(err.to_string()));
                let mut context = form.context;
                if let Value::Object(map) = &mut context {
                    map.insert("errors".to_string(), Value::Object(errors));
                }
                view::page(
                    state.renderer.as_ref(),
                    StatusCode::UNPROCESSABLE_ENTITY,
                    form.template,
                    &context,
                )
            }
            None => redirect_error(list_path, &err.to_string()),
        },
        ErrorClass::NotFound => view::page(
            state.renderer.as_ref(),
            StatusCode::NOT_FOUND,
            "not_found",
            &json!({ "message": err.to_string() }),
        ),
        ErrorClass::BusinessRule => {
            warn!("{err}");
            redirect_error(list_path, &err.to_string())
        }
        ErrorClass::Internal => {
            error!("Request failed: {err}");
            view::page(
                state.renderer.as_ref(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                &json!({ "message": "Internal error" }),
            )
        }
    }
}
