use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::handlers::require_shop_open;
use crate::models::ticket_type::{self, NewTicketType};
use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// GET /ticket_types — the public catalog with live amount_left.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_shop_open(&state, &headers).await?;
    let types = ticket_type::get_all_ticket_types(&state.pool).await?;
    Ok(success(types))
}

/// GET /ticket_types/:id
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_shop_open(&state, &headers).await?;
    let tt = ticket_type::get_ticket_type(&state.pool, id).await?;
    Ok(success(tt))
}

/// POST /ticket_types (admin)
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewTicketType>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    new.validate()?;
    let tt = ticket_type::create_ticket_type(&state.pool, &new).await?;
    Ok(success(tt))
}

/// PUT /ticket_types/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(new): Json<NewTicketType>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    new.validate()?;
    let tt = ticket_type::update_ticket_type(&state.pool, id, &new).await?;
    Ok(success(tt))
}

/// DELETE /ticket_types/:id (admin)
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    let id = ticket_type::delete_ticket_type(&state.pool, id).await?;
    Ok(success(json!({ "id": id })))
}
