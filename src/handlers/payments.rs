use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::{payment, reservation};
use crate::state::AppState;
use crate::utils::auth::{is_authenticated, require_auth};
use crate::utils::error::AppError;
use crate::utils::events::ShopEvent;
use crate::utils::response::success;

/// GET /payments (admin)
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&headers, &state.config.jwt_secret)?;
    let rows = payment::get_all_payments(&state.pool).await?;
    Ok(success(rows))
}

/// GET /payments/:reservation
///
/// Public checkout polling: an unauthenticated caller only learns whether a
/// payment exists; admins see the full row.
pub async fn get_one(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reservation): Path<Uuid>,
) -> Result<Response, AppError> {
    let pay = payment::get_payment_for_reservation(&state.pool, reservation)
        .await?
        .ok_or_else(|| AppError::NotFound("payment not done yet".to_string()))?;

    if is_authenticated(&headers, &state.config.jwt_secret) {
        Ok(success(pay))
    } else {
        Ok(success(json!({ "created_at": pay.created_at })))
    }
}

/// POST /payments/:reservation
///
/// Open a fresh checkout for an unpaid reservation. Used when a buyer
/// canceled the checkout that was created along with the completion.
pub async fn create(
    State(state): State<AppState>,
    Path(reservation): Path<Uuid>,
) -> Result<Response, AppError> {
    if payment::get_payment_for_reservation(&state.pool, reservation)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("reservation already paid".to_string()));
    }

    let res =
        reservation::get_reservation_with_details(&state.pool, state.hold(), reservation).await?;
    let mollie = state.mollie.create_payment(res.id, res.price).await?;
    let checkout = mollie.checkout_url().ok_or_else(|| {
        AppError::ExternalServiceError("payment provider returned no checkout url".to_string())
    })?;

    Ok(success(json!({ "checkout": checkout })))
}

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    pub id: String,
}

/// POST /payments/:reservation/webhook
///
/// Mollie's confirmation callback. The payload's status is never trusted:
/// the payment is re-fetched from the provider, and only `paid` leads to a
/// Payment row. Redelivered webhooks hit the uniqueness constraint and are
/// absorbed as benign duplicates; ticket mail goes out at most once, as a
/// post-commit task that cannot roll back the payment.
pub async fn webhook(
    State(state): State<AppState>,
    Path(reservation): Path<Uuid>,
    Form(body): Form<WebhookBody>,
) -> Result<Response, AppError> {
    if body.id.is_empty() {
        return Err(AppError::ValidationError(
            "webhook called without payment id".to_string(),
        ));
    }

    let mollie_payment = state.mollie.fetch_payment(&body.id).await?;

    if !mollie_payment.is_paid() {
        tracing::warn!(
            reservation = %reservation,
            status = ?mollie_payment.status,
            "webhook for non-paid status, ignoring"
        );
        return Ok((axum::http::StatusCode::OK, "ack").into_response());
    }

    // Delivery data is loaded before the payment row exists: if this read
    // fails we return 500 with nothing recorded, and the provider's
    // redelivery retries the whole sequence. Fetching it after the insert
    // would let a transient failure land in the duplicate branch on retry,
    // which never mails.
    let res =
        reservation::get_reservation_with_details(&state.pool, state.hold(), reservation).await?;

    match payment::create_payment(&state.pool, reservation, &body.id).await {
        Ok(_) => {
            state
                .events
                .publish(ShopEvent::PaymentConfirmed { reservation });

            // Payment is committed; ticket delivery is best-effort and
            // retryable without touching the payment record.
            let mailer = state.mailer.clone();
            let qr = state.qr.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer.send_tickets(&qr, &res.tickets, false).await {
                    tracing::error!(
                        reservation = %res.id,
                        error = ?e,
                        "failed to send tickets after payment"
                    );
                }
            });
        }
        Err(AppError::Conflict(_)) => {
            // Redelivery: the payment is already recorded, do not mail again
            tracing::info!(reservation = %reservation, "duplicate payment webhook, ignoring");
        }
        Err(e) => return Err(e),
    }

    Ok((axum::http::StatusCode::OK, "ack").into_response())
}
