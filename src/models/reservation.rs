//! Reservation lifecycle: timed holds on ticket inventory.
//!
//! A reservation owns its ticket rows from the moment it is created, so an
//! unpaid hold already consumes capacity. Expiry is never stored: it is
//! recomputed from `created_at` on every read, and enforced eventually by the
//! cleanup task deleting rows.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::ticket::Ticket;
use crate::utils::error::AppError;

/// A reservation request: requested amount per ticket type id.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct NewReservation(pub HashMap<Uuid, i64>);

impl NewReservation {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.0.is_empty() {
            return Err(AppError::ValidationError(
                "new reservation does not pass validation".to_string(),
            ));
        }
        if self.0.values().any(|&amount| amount <= 0) {
            return Err(AppError::ValidationError(
                "new reservation does not pass validation".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationWithDetails {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expired: bool,
    pub valid_until: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
    /// Total price in minor currency units.
    pub price: i64,
}

/// Admin listing row: one reservation with aggregate ticket count, price,
/// reserver contact details and paid flag.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReservationAdminRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub amount: i64,
    pub price: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub paid: bool,
}

/// The instant a reservation's hold on its tickets lapses.
pub fn valid_until(created_at: DateTime<Utc>, hold: Duration) -> DateTime<Utc> {
    created_at + chrono::Duration::milliseconds(hold.as_millis() as i64)
}

/// Expiry is inclusive: a reservation is expired from `valid_until` onwards.
pub fn is_expired_at(created_at: DateTime<Utc>, hold: Duration, now: DateTime<Utc>) -> bool {
    now >= valid_until(created_at, hold)
}

pub fn is_expired(created_at: DateTime<Utc>, hold: Duration) -> bool {
    is_expired_at(created_at, hold, Utc::now())
}

#[derive(FromRow)]
struct LockedType {
    id: Uuid,
    amount_available: i32,
}

/// Create a timed hold on the requested tickets.
///
/// The availability check and the ticket inserts run in one transaction, with
/// the requested `ticket_types` rows locked `FOR UPDATE`. Two concurrent
/// requests for the same type therefore serialize on the row lock, and the
/// second one recomputes availability after the first has committed its
/// ticket rows, so the sum of inserted tickets can never exceed
/// `amount_available`. All-or-nothing: if any requested type is short, no
/// rows are created.
pub async fn create_reservation(
    pool: &PgPool,
    hold: Duration,
    new: &NewReservation,
) -> Result<ReservationWithDetails, AppError> {
    new.validate()?;

    let requested_ids: Vec<Uuid> = new.0.keys().copied().collect();

    let mut tx = pool.begin().await?;

    // Lock the requested type rows; concurrent creates for the same types
    // queue up behind this statement. ORDER BY id keeps lock acquisition
    // deterministic so overlapping multi-type requests cannot deadlock.
    let locked = sqlx::query_as::<_, LockedType>(
        "SELECT id, amount_available FROM ticket_types WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&requested_ids)
    .fetch_all(&mut *tx)
    .await?;

    if locked.len() != requested_ids.len() {
        return Err(AppError::NotFound("ticket type not found".to_string()));
    }

    // Availability, recomputed inside the transaction while holding the locks
    let counts: Vec<(Uuid, i64)> = sqlx::query_as(
        r#"
        SELECT ticket_type, COUNT(*)
        FROM tickets
        WHERE ticket_type = ANY($1)
        GROUP BY ticket_type
        "#,
    )
    .bind(&requested_ids)
    .fetch_all(&mut *tx)
    .await?;
    let issued: HashMap<Uuid, i64> = counts.into_iter().collect();

    for tt in &locked {
        let left = i64::from(tt.amount_available) - issued.get(&tt.id).copied().unwrap_or(0);
        if new.0[&tt.id] > left {
            return Err(AppError::SoldOut);
        }
    }

    let (reservation_id,): (Uuid,) =
        sqlx::query_as("INSERT INTO reservations (created_at) VALUES (DEFAULT) RETURNING id")
            .fetch_one(&mut *tx)
            .await?;

    // One ticket row per requested unit. Each insert completes before the
    // transaction commits, so the reservation is never visible without its
    // tickets.
    for (&ticket_type, &amount) in &new.0 {
        sqlx::query(
            r#"
            INSERT INTO tickets (reservation, ticket_type)
            SELECT $1, $2 FROM generate_series(1, $3)
            "#,
        )
        .bind(reservation_id)
        .bind(ticket_type)
        .bind(amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_reservation_with_details(pool, hold, reservation_id).await
}

#[derive(FromRow)]
struct ReservationTicketRow {
    id: Uuid,
    reservation: Uuid,
    ticket_type: Uuid,
    ticket_name: String,
    price: i32,
    owner_counter: i32,
    owner_email: String,
    owner_first_name: String,
    owner_last_name: String,
    owner_society: String,
    created_at: DateTime<Utc>,
}

/// A reservation with its tickets, each carrying its type name and price,
/// plus the computed total price and expiry state.
pub async fn get_reservation_with_details(
    pool: &PgPool,
    hold: Duration,
    id: Uuid,
) -> Result<ReservationWithDetails, AppError> {
    let rows = sqlx::query_as::<_, ReservationTicketRow>(
        r#"
        SELECT
            t.id,
            r.id AS reservation,
            t.ticket_type,
            tt.name AS ticket_name,
            tt.price,
            t.owner_counter,
            t.owner_email,
            t.owner_first_name,
            t.owner_last_name,
            t.owner_society,
            r.created_at
        FROM
            reservations AS r
            JOIN tickets AS t ON r.id = t.reservation
            JOIN ticket_types AS tt ON t.ticket_type = tt.id
        WHERE
            r.id = $1
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let Some(first) = rows.first() else {
        return Err(AppError::NotFound("reservation not found".to_string()));
    };

    let created_at = first.created_at;
    let price = rows.iter().map(|r| i64::from(r.price)).sum();

    Ok(ReservationWithDetails {
        id,
        created_at,
        valid_until: valid_until(created_at, hold),
        expired: is_expired(created_at, hold),
        price,
        tickets: rows
            .into_iter()
            .map(|r| Ticket {
                id: r.id,
                reservation: r.reservation,
                ticket_type: r.ticket_type,
                ticket_name: Some(r.ticket_name),
                price: Some(r.price),
                owner_counter: r.owner_counter,
                owner_email: r.owner_email,
                owner_first_name: r.owner_first_name,
                owner_last_name: r.owner_last_name,
                owner_society: r.owner_society,
            })
            .collect(),
    })
}

pub async fn get_all_reservations(pool: &PgPool) -> Result<Vec<ReservationAdminRow>, AppError> {
    let rows = sqlx::query_as::<_, ReservationAdminRow>(
        r#"
        SELECT
            r.id,
            r.created_at,
            COUNT(t.id) AS amount,
            COALESCE(SUM(tt.price), 0)::bigint AS price,
            STRING_AGG(DISTINCT c.email, ',') AS email,
            STRING_AGG(DISTINCT c.first_name, ',') AS first_name,
            STRING_AGG(DISTINCT c.last_name, ',') AS last_name,
            BOOL_OR(p.reservation IS NOT NULL) AS paid
        FROM
            reservations AS r
            JOIN tickets AS t ON r.id = t.reservation
            JOIN ticket_types AS tt ON t.ticket_type = tt.id
            LEFT JOIN completions AS c ON r.id = c.reservation
            LEFT JOIN payments AS p ON r.id = p.reservation
        GROUP BY
            r.id
        ORDER BY
            r.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Release expired holds. First drop completions whose reservation never got
/// a payment, then drop reservations that have no completion; ticket rows go
/// with their reservation via ON DELETE CASCADE. A reservation with a payment
/// is never swept.
pub async fn delete_expired(
    pool: &PgPool,
    hold: Duration,
) -> Result<(u64, u64), AppError> {
    let hold_secs = hold.as_secs_f64();

    let completions = sqlx::query(
        r#"
        DELETE FROM completions
        WHERE reservation IN (
            SELECT c.reservation
            FROM completions AS c
            LEFT JOIN payments AS p ON c.reservation = p.reservation
            INNER JOIN reservations AS r ON r.id = c.reservation
            WHERE p.id IS NULL
              AND r.created_at < (CURRENT_TIMESTAMP - make_interval(secs => $1))
        )
        "#,
    )
    .bind(hold_secs)
    .execute(pool)
    .await?
    .rows_affected();

    let reservations = sqlx::query(
        r#"
        DELETE FROM reservations
        WHERE id IN (
            SELECT r.id
            FROM reservations AS r
            LEFT JOIN completions AS c ON r.id = c.reservation
            WHERE c.reservation IS NULL
              AND r.created_at < (CURRENT_TIMESTAMP - make_interval(secs => $1))
        )
        "#,
    )
    .bind(hold_secs)
    .execute(pool)
    .await?
    .rows_affected();

    Ok((completions, reservations))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(600_000);

    #[test]
    fn test_valid_until_adds_hold_duration() {
        let created = Utc::now();
        let until = valid_until(created, HOLD);
        assert_eq!(until - created, chrono::Duration::minutes(10));
    }

    #[test]
    fn test_not_expired_just_before_boundary() {
        let created = Utc::now();
        let just_before = valid_until(created, HOLD) - chrono::Duration::milliseconds(1);
        assert!(!is_expired_at(created, HOLD, just_before));
    }

    #[test]
    fn test_expired_exactly_at_boundary() {
        let created = Utc::now();
        let boundary = valid_until(created, HOLD);
        assert!(is_expired_at(created, HOLD, boundary));
    }

    #[test]
    fn test_expired_after_boundary() {
        let created = Utc::now() - chrono::Duration::minutes(11);
        assert!(is_expired(created, HOLD));
    }

    #[test]
    fn test_empty_reservation_fails_validation() {
        let new = NewReservation(HashMap::new());
        assert!(matches!(
            new.validate(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_amount_fails_validation() {
        let mut map = HashMap::new();
        map.insert(Uuid::new_v4(), 0);
        assert!(NewReservation(map).validate().is_err());
    }

    #[test]
    fn test_negative_amount_fails_validation() {
        let mut map = HashMap::new();
        map.insert(Uuid::new_v4(), -3);
        assert!(NewReservation(map).validate().is_err());
    }

    #[test]
    fn test_positive_amounts_pass_validation() {
        let mut map = HashMap::new();
        map.insert(Uuid::new_v4(), 2);
        map.insert(Uuid::new_v4(), 1);
        assert!(NewReservation(map).validate().is_ok());
    }
}
