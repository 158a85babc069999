use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::handlers::require_shop_open;
use crate::models::reservation::{self, NewReservation};
use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::events::ShopEvent;
use crate::utils::response::success;

/// GET /reservations (admin)
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    let rows = reservation::get_all_reservations(&state.pool).await?;
    Ok(success(rows))
}

/// GET /reservations/:id — a buyer polls this while completing checkout.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let res = reservation::get_reservation_with_details(&state.pool, state.hold(), id).await?;
    Ok(success(res))
}

/// POST /reservations — place a timed hold on tickets.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewReservation>,
) -> Result<Response, AppError> {
    require_shop_open(&state, &headers).await?;

    let res = reservation::create_reservation(&state.pool, state.hold(), &new).await?;

    state.events.publish(ShopEvent::ReservationCreated {
        reservation: res.id,
    });

    Ok(success(res))
}
