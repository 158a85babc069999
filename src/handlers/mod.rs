use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::state::AppState;
use crate::utils::auth::is_authenticated;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod auth;
pub mod completions;
pub mod payments;
pub mod reservations;
pub mod settings;
pub mod statistics;
pub mod ticket_scans;
pub mod ticket_types;
pub mod tickets;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "bae-shop-api",
    };

    success(payload).into_response()
}

/// Public shop endpoints are reachable while the shop is open, or for an
/// authenticated admin at any time.
pub async fn require_shop_open(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if state.settings.is_open().await || is_authenticated(headers, &state.config.jwt_secret) {
        Ok(())
    } else {
        Err(AppError::Forbidden("ticket shop closed".to_string()))
    }
}
