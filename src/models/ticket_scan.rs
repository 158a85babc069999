use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::error::AppError;

/// The single authoritative "this ticket entered" event. Created once by the
/// scan gate, never updated or deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketScan {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Record a scan. The UNIQUE constraint on `ticket_id` is the backstop
/// against two near-simultaneous scans of the same ticket; the loser gets
/// `Conflict` and the handler reports it as already scanned.
pub async fn create_ticket_scan(pool: &PgPool, ticket_id: Uuid) -> Result<TicketScan, AppError> {
    sqlx::query_as::<_, TicketScan>(
        r#"
        INSERT INTO ticket_scans (ticket_id)
        VALUES ($1)
        RETURNING id, ticket_id, created_at
        "#,
    )
    .bind(ticket_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if AppError::is_unique_violation(&e) {
            AppError::Conflict("ticket already scanned".to_string())
        } else {
            AppError::DatabaseError(e)
        }
    })
}

pub async fn get_scan_for_ticket(
    pool: &PgPool,
    ticket_id: Uuid,
) -> Result<Option<TicketScan>, AppError> {
    let row = sqlx::query_as::<_, TicketScan>(
        "SELECT id, ticket_id, created_at FROM ticket_scans WHERE ticket_id = $1",
    )
    .bind(ticket_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
