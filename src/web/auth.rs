//! Staff authentication for write operations.
//!
//! Write handlers take a [`Staff`] argument; extracting it resolves the `session`
//! cookie through the configured [`Authenticator`]. Read-only views do not ask for
//! it and stay public.

use super::{AppState, view};
use crate::config::seed::StaffConfig;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::Response,
};
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// An authenticated staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    /// Username recorded on reservations and orders
    pub name: String,
}

/// Resolves a session token to a staff member.
pub trait Authenticator: Send + Sync {
    /// Returns the staff member owning `token`, if any.
    fn authenticate(&self, token: &str) -> Option<Staff>;
}

/// Session tokens taken from the `[[staff]]` entries of config.toml.
#[derive(Debug, Clone, Default)]
pub struct StaffSessions {
    tokens: HashMap<String, String>,
}

impl StaffSessions {
    /// Builds the token table from configuration. Blank tokens are ignored.
    #[must_use]
    pub fn from_config(staff: &[StaffConfig]) -> Self {
        let tokens = staff
            .iter()
            .filter(|s| !s.session_token.trim().is_empty())
            .map(|s| (s.session_token.clone(), s.name.clone()))
            .collect();
        Self { tokens }
    }
}

impl Authenticator for StaffSessions {
    fn authenticate(&self, token: &str) -> Option<Staff> {
        self.tokens.get(token).map(|name| Staff { name: name.clone() })
    }
}

fn session_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
}

impl FromRequestParts<AppState> for Staff {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(staff) = session_token(parts).and_then(|t| state.authenticator.authenticate(t))
        {
            return Ok(staff);
        }
        debug!("Rejected unauthenticated {} {}", parts.method, parts.uri);
        Err(view::page(
            state.renderer.as_ref(),
            StatusCode::UNAUTHORIZED,
            "auth/login_required",
            &json!({ "next": parts.uri.path() }),
        ))
    }
}
