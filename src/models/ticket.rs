use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::utils::error::AppError;

/// A single issued ticket. `ticket_name` and `price` come from the joined
/// ticket type and are absent on bare row reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub reservation: Uuid,
    pub ticket_type: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i32>,
    /// Bumped on every re-personalization; QR tokens embedding an older value
    /// are permanently invalid.
    pub owner_counter: i32,
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_society: String,
}

/// Admin view of a ticket: owner, reserver contact details from the
/// completion, and whether the ticket was paid and scanned.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketAdminRow {
    pub id: Uuid,
    pub reservation: Uuid,
    pub ticket_type: Uuid,
    pub ticket_name: Option<String>,
    pub ticket_price: Option<i32>,
    pub owner_counter: i32,
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_society: String,
    pub reserver_email: Option<String>,
    pub reserver_first_name: Option<String>,
    pub reserver_last_name: Option<String>,
    pub paid: bool,
    pub scanned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketStatistics {
    pub date: NaiveDate,
    pub ticket_type: Uuid,
    pub name: String,
    pub amount: i64,
    pub revenue: i64,
}

/// New owner details for (re-)personalization.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerDetails {
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_society: String,
}

impl OwnerDetails {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.owner_email.trim().is_empty()
            || self.owner_first_name.trim().is_empty()
            || self.owner_last_name.trim().is_empty()
        {
            return Err(AppError::ValidationError(
                "please provide new owner email, first name and last name".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn get_all_tickets(pool: &PgPool) -> Result<Vec<TicketAdminRow>, AppError> {
    let rows = sqlx::query_as::<_, TicketAdminRow>(
        r#"
        SELECT
            t.id,
            t.reservation,
            t.ticket_type,
            STRING_AGG(DISTINCT tt.name, ',') AS ticket_name,
            MAX(tt.price) AS ticket_price,
            t.owner_counter,
            t.owner_email,
            t.owner_first_name,
            t.owner_last_name,
            t.owner_society,
            STRING_AGG(DISTINCT c.email, ',') AS reserver_email,
            STRING_AGG(DISTINCT c.first_name, ',') AS reserver_first_name,
            STRING_AGG(DISTINCT c.last_name, ',') AS reserver_last_name,
            BOOL_OR(p.id IS NOT NULL) AS paid,
            BOOL_OR(ts.id IS NOT NULL) AS scanned,
            r.created_at
        FROM
            tickets AS t
            JOIN reservations AS r ON r.id = t.reservation
            JOIN completions AS c ON c.reservation = t.reservation
            JOIN ticket_types AS tt ON t.ticket_type = tt.id
            LEFT JOIN payments AS p ON r.id = p.reservation
            LEFT JOIN ticket_scans AS ts ON t.id = ts.ticket_id
        GROUP BY
            t.id, c.reservation, r.id, p.id, ts.id
        ORDER BY
            r.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_ticket_by_id(pool: &PgPool, id: Uuid) -> Result<Ticket, AppError> {
    sqlx::query_as::<_, Ticket>(
        r#"
        SELECT
            t.id,
            t.reservation,
            t.ticket_type,
            tt.name AS ticket_name,
            tt.price,
            t.owner_counter,
            t.owner_email,
            t.owner_first_name,
            t.owner_last_name,
            t.owner_society
        FROM
            tickets AS t
            JOIN ticket_types AS tt ON t.ticket_type = tt.id
        WHERE
            t.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("ticket not found".to_string()))
}

/// Per-day, per-type sales numbers for the admin dashboard.
pub async fn ticket_statistics(pool: &PgPool) -> Result<Vec<TicketStatistics>, AppError> {
    let rows = sqlx::query_as::<_, TicketStatistics>(
        r#"
        SELECT
            r.created_at::date AS date,
            t.ticket_type,
            tt.name,
            COUNT(*) AS amount,
            COUNT(*) * MAX(tt.price)::bigint AS revenue
        FROM
            tickets AS t
            JOIN reservations AS r ON r.id = t.reservation
            JOIN ticket_types AS tt ON t.ticket_type = tt.id
        GROUP BY
            r.created_at::date, t.ticket_type, tt.id
        ORDER BY
            r.created_at::date DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Update one ticket's owner and bump its counter, invalidating every QR
/// token issued so far. Used by admin edits and resale re-personalization.
pub async fn personalize_by_id(
    pool: &PgPool,
    id: Uuid,
    owner: &OwnerDetails,
) -> Result<Uuid, AppError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE tickets
        SET
            owner_email = $1,
            owner_first_name = $2,
            owner_last_name = $3,
            owner_society = $4,
            owner_counter = owner_counter + 1
        WHERE id = $5
        RETURNING id
        "#,
    )
    .bind(&owner.owner_email)
    .bind(&owner.owner_first_name)
    .bind(&owner.owner_last_name)
    .bind(&owner.owner_society)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(|(id,)| id)
        .ok_or_else(|| AppError::NotFound("ticket not found".to_string()))
}

/// Initial personalization of all tickets under a reservation, performed as
/// part of completing it. Does not bump the counter: the first QR tokens
/// issued must match the counter the tickets were created with. Only callable
/// inside the completion transaction.
pub async fn personalize_by_reservation(
    tx: &mut Transaction<'_, Postgres>,
    reservation: Uuid,
    email: &str,
    first_name: &str,
    last_name: &str,
    society: &str,
) -> Result<Vec<Uuid>, AppError> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE tickets
        SET
            owner_email = $1,
            owner_first_name = $2,
            owner_last_name = $3,
            owner_society = $4
        WHERE reservation = $5
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(society)
    .bind(reservation)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerDetails {
        OwnerDetails {
            owner_email: "alice@example.com".to_string(),
            owner_first_name: "Alice".to_string(),
            owner_last_name: "Jansen".to_string(),
            owner_society: "".to_string(),
        }
    }

    #[test]
    fn test_valid_owner_passes() {
        assert!(owner().validate().is_ok());
    }

    #[test]
    fn test_society_may_be_empty() {
        // Not everyone belongs to a society
        assert!(owner().validate().is_ok());
    }

    #[test]
    fn test_blank_email_fails() {
        let mut o = owner();
        o.owner_email = " ".to_string();
        assert!(matches!(o.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_blank_name_fails() {
        let mut o = owner();
        o.owner_first_name = String::new();
        assert!(o.validate().is_err());
    }
}
