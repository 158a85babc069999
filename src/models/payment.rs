use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::error::AppError;

/// Provider confirmation for a reservation. The UNIQUE constraint on
/// `reservation` is the idempotency boundary for redelivered webhooks.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub reservation: Uuid,
    pub mollie_id: String,
    pub created_at: DateTime<Utc>,
}

/// Record a confirmed payment. A second call for the same reservation fails
/// the uniqueness constraint and returns `Conflict`; the webhook handler
/// treats that as a benign duplicate and must not re-send tickets.
pub async fn create_payment(
    pool: &PgPool,
    reservation: Uuid,
    mollie_id: &str,
) -> Result<Payment, AppError> {
    sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (reservation, mollie_id, created_at)
        VALUES ($1, $2, DEFAULT)
        RETURNING id, reservation, mollie_id, created_at
        "#,
    )
    .bind(reservation)
    .bind(mollie_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if AppError::is_unique_violation(&e) {
            AppError::Conflict("reservation already paid".to_string())
        } else {
            AppError::DatabaseError(e)
        }
    })
}

pub async fn get_all_payments(pool: &PgPool) -> Result<Vec<Payment>, AppError> {
    let rows = sqlx::query_as::<_, Payment>(
        "SELECT id, reservation, mollie_id, created_at FROM payments",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `None` means "not paid yet", which public checkout polling hits constantly.
pub async fn get_payment_for_reservation(
    pool: &PgPool,
    reservation: Uuid,
) -> Result<Option<Payment>, AppError> {
    let row = sqlx::query_as::<_, Payment>(
        "SELECT id, reservation, mollie_id, created_at FROM payments WHERE reservation = $1",
    )
    .bind(reservation)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
