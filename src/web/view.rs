//! View rendering boundary.
//!
//! Handlers build a template name and a JSON context; a [`ViewRenderer`] turns them
//! into a document. [`JsonRenderer`] is the built-in implementation and emits the
//! context itself, which keeps the handlers testable without a template engine.

use crate::errors::Result;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// A rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// MIME type of `body`
    pub content_type: &'static str,
    /// Document text
    pub body: String,
}

/// Turns a template name and its context into a document.
pub trait ViewRenderer: Send + Sync {
    /// Renders `template` with `context`.
    fn render(&self, template: &str, context: &Value) -> Result<Rendered>;
}

/// Renders every view as a JSON document `{"template": ..., "context": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ViewRenderer for JsonRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<Rendered> {
        let body = serde_json::to_string(&json!({
            "template": template,
            "context": context,
        }))?;
        Ok(Rendered {
            content_type: "application/json",
            body,
        })
    }
}

/// Renders a view into a response with `status`.
pub fn page(
    renderer: &dyn ViewRenderer,
    status: StatusCode,
    template: &str,
    context: &Value,
) -> Response {
    match renderer.render(template, context) {
        Ok(rendered) => (
            status,
            [(header::CONTENT_TYPE, rendered.content_type)],
            rendered.body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to render {template}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_json_renderer_wraps_context() {
        let rendered = JsonRenderer
            .render("tables/list", &json!({"tables": []}))
            .unwrap();
        assert_eq!(rendered.content_type, "application/json");

        let doc: Value = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(doc["template"], "tables/list");
        assert_eq!(doc["context"]["tables"], json!([]));
    }
}
