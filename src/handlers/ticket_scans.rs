use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::models::{ticket, ticket_scan};
use crate::state::AppState;
use crate::utils::auth::require_auth;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub qr: String,
}

/// POST /ticket_scans (admin)
///
/// The door check. Outcomes are deliberately distinct: a valid first scan
/// returns the ticket and owner, a replayed token reports when the ticket
/// entered, and a token from before a resale reports who owns it now.
pub async fn scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ScanRequest>,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;

    if body.qr.is_empty() {
        return Err(AppError::ValidationError(
            "new ticket scan does not pass validation".to_string(),
        ));
    }

    let (ticket_id, token_counter) = state.qr.decode(&body.qr)?;

    if let Some(existing) = ticket_scan::get_scan_for_ticket(&state.pool, ticket_id).await? {
        return Err(AppError::AlreadyScanned {
            scanned_at: existing.created_at,
        });
    }

    let ticket = ticket::get_ticket_by_id(&state.pool, ticket_id).await?;

    // Token validity before recording anything: a token minted against an
    // older counter belongs to a previous owner.
    if ticket.owner_counter != token_counter {
        return Err(AppError::StaleToken {
            current_owner: json!({
                "owner_email": ticket.owner_email,
                "owner_first_name": ticket.owner_first_name,
                "owner_last_name": ticket.owner_last_name,
                "owner_society": ticket.owner_society,
            }),
        });
    }

    match ticket_scan::create_ticket_scan(&state.pool, ticket_id).await {
        Ok(_) => Ok(success(ticket)),
        // Lost a race against a simultaneous scan of the same ticket; the
        // uniqueness constraint kept the row count at one.
        Err(AppError::Conflict(_)) => {
            let existing = ticket_scan::get_scan_for_ticket(&state.pool, ticket_id)
                .await?
                .ok_or_else(|| {
                    AppError::InternalServerError("scan row vanished".to_string())
                })?;
            Err(AppError::AlreadyScanned {
                scanned_at: existing.created_at,
            })
        }
        Err(e) => Err(e),
    }
}
