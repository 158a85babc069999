use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Integer minor currency units (euro cents).
    pub price: i32,
    pub amount_available: i32,
    /// Derived: amount_available minus the number of ticket rows that exist
    /// for this type, regardless of payment status. Absent on single-row
    /// reads that do not compute it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_left: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicketType {
    pub name: String,
    pub description: String,
    pub price: i32,
    pub amount_available: i32,
}

impl NewTicketType {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "ticket type name must not be empty".to_string(),
            ));
        }
        if self.price < 0 {
            return Err(AppError::ValidationError(
                "ticket type price must not be negative".to_string(),
            ));
        }
        if self.amount_available < 0 {
            return Err(AppError::ValidationError(
                "ticket type capacity must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn create_ticket_type(
    pool: &PgPool,
    new: &NewTicketType,
) -> Result<TicketType, AppError> {
    let row = sqlx::query_as::<_, TicketType>(
        r#"
        INSERT INTO ticket_types (name, description, price, amount_available)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, description, price, amount_available, NULL::int AS amount_left
        "#,
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price)
    .bind(new.amount_available)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_all_ticket_types(pool: &PgPool) -> Result<Vec<TicketType>, AppError> {
    let rows = sqlx::query_as::<_, TicketType>(
        r#"
        SELECT
            tt.id,
            tt.name,
            tt.description,
            tt.price,
            tt.amount_available,
            COALESCE(CAST(tt.amount_available - COUNT(t.id) AS int), tt.amount_available)
                AS amount_left
        FROM
            ticket_types AS tt
            LEFT JOIN tickets AS t ON tt.id = t.ticket_type
        GROUP BY
            tt.id
        ORDER BY
            tt.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_ticket_type(pool: &PgPool, id: Uuid) -> Result<TicketType, AppError> {
    sqlx::query_as::<_, TicketType>(
        r#"
        SELECT
            tt.id,
            tt.name,
            tt.description,
            tt.price,
            tt.amount_available,
            COALESCE(CAST(tt.amount_available - COUNT(t.id) AS int), tt.amount_available)
                AS amount_left
        FROM
            ticket_types AS tt
            LEFT JOIN tickets AS t ON tt.id = t.ticket_type
        WHERE
            tt.id = $1
        GROUP BY
            tt.id
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("ticket type not found".to_string()))
}

pub async fn update_ticket_type(
    pool: &PgPool,
    id: Uuid,
    new: &NewTicketType,
) -> Result<TicketType, AppError> {
    sqlx::query_as::<_, TicketType>(
        r#"
        UPDATE ticket_types
        SET name = $1, description = $2, price = $3, amount_available = $4
        WHERE id = $5
        RETURNING id, name, description, price, amount_available, NULL::int AS amount_left
        "#,
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price)
    .bind(new.amount_available)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("ticket type not found".to_string()))
}

pub async fn delete_ticket_type(pool: &PgPool, id: Uuid) -> Result<Uuid, AppError> {
    let row: Option<(Uuid,)> = sqlx::query_as("DELETE FROM ticket_types WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(|(id,)| id)
        .ok_or_else(|| AppError::NotFound("ticket type not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NewTicketType {
        NewTicketType {
            name: "Entry".to_string(),
            description: "General admission".to_string(),
            price: 1250,
            amount_available: 400,
        }
    }

    #[test]
    fn test_valid_ticket_type_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_empty_name_fails() {
        let mut tt = base();
        tt.name = "  ".to_string();
        assert!(matches!(tt.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_negative_price_fails() {
        let mut tt = base();
        tt.price = -1;
        assert!(tt.validate().is_err());
    }

    #[test]
    fn test_negative_capacity_fails() {
        let mut tt = base();
        tt.amount_available = -5;
        assert!(tt.validate().is_err());
    }

    #[test]
    fn test_free_tickets_are_allowed() {
        let mut tt = base();
        tt.price = 0;
        assert!(tt.validate().is_ok());
    }
}
