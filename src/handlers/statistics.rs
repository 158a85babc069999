use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde_json::json;

use crate::models::{ticket, ticket_type};
use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// GET /statistics (admin) — totals per ticket type plus sales per day.
pub async fn get_statistics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;

    let totals = ticket_type::get_all_ticket_types(&state.pool).await?;
    let sales_per_day = ticket::ticket_statistics(&state.pool).await?;

    Ok(success(json!({
        "totals": totals,
        "sales_per_day": sales_per_day,
    })))
}
