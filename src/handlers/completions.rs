use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::handlers::require_shop_open;
use crate::models::{
    completion::{self, NewCompletion},
    reservation,
};
use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// GET /completions (admin)
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    let rows = completion::get_all_completions(&state.pool).await?;
    Ok(success(rows))
}

/// GET /completions/:reservation — 404 simply means "not completed yet".
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reservation): Path<Uuid>,
) -> Result<Response, AppError> {
    require_shop_open(&state, &headers).await?;
    let com = completion::get_completion_for_reservation(&state.pool, reservation)
        .await?
        .ok_or_else(|| AppError::NotFound("reservation not yet made complete".to_string()))?;
    Ok(success(com))
}

/// POST /completions — attach buyer details to a reservation and open a
/// checkout with the payment provider.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewCompletion>,
) -> Result<Response, AppError> {
    require_shop_open(&state, &headers).await?;
    new.validate()?;

    let res =
        reservation::get_reservation_with_details(&state.pool, state.hold(), new.reservation)
            .await?;

    // The hold is authoritative: a reservation past its window cannot be
    // completed even if the cleanup task has not swept it yet.
    if res.expired {
        return Err(AppError::Forbidden("reservation expired".to_string()));
    }

    // A duplicate submit trips the uniqueness constraint and surfaces as 409
    completion::create_completion(&state.pool, &new).await?;

    let payment = state.mollie.create_payment(res.id, res.price).await?;
    let checkout = payment.checkout_url().ok_or_else(|| {
        AppError::ExternalServiceError("payment provider returned no checkout url".to_string())
    })?;

    Ok(success(json!({ "checkout": checkout })))
}
