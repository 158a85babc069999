use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::models::ticket::{self, OwnerDetails};
use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// GET /tickets (admin)
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    let rows = ticket::get_all_tickets(&state.pool).await?;
    Ok(success(rows))
}

/// GET /tickets/:id (admin)
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    let t = ticket::get_ticket_by_id(&state.pool, id).await?;
    Ok(success(t))
}

/// PUT /tickets/:id (admin)
///
/// Re-personalize a ticket to a new owner. Bumps the owner counter, which
/// invalidates every QR token issued so far, and mails a fresh token to the
/// new owner.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(owner): Json<OwnerDetails>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    owner.validate()?;

    ticket::personalize_by_id(&state.pool, id, &owner).await?;
    let updated = ticket::get_ticket_by_id(&state.pool, id).await?;

    state
        .mailer
        .send_tickets(&state.qr, std::slice::from_ref(&updated), true)
        .await?;

    Ok(success(updated))
}
