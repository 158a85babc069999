use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;
use crate::utils::auth::issue_token;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub user: String,
    pub password: String,
}

/// POST /auth/token
///
/// Exchange admin credentials for a one-hour bearer token.
pub async fn create_token(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Response, AppError> {
    if body.user.is_empty() || body.password.is_empty() {
        return Err(AppError::ValidationError(
            "please provide user credentials".to_string(),
        ));
    }

    let password_ok = bcrypt::verify(&body.password, &state.config.admin_password_hash)
        .map_err(|e| AppError::InternalServerError(format!("password check failed: {e}")))?;

    if body.user != state.config.admin_username || !password_ok {
        return Err(AppError::AuthError("invalid credentials".to_string()));
    }

    let token = issue_token(&state.config.jwt_secret)?;
    Ok(success(json!({ "token": token })))
}
