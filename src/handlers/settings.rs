use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;

use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::utils::settings::ShopSettings;

/// GET /settings/open — public; the client renders a countdown from this.
pub async fn get_open(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(success(state.settings.get().await))
}

/// PUT /settings/open (admin)
pub async fn put_open(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<ShopSettings>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    Ok(success(state.settings.set(new).await))
}
