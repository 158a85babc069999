use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::ticket;
use crate::utils::error::AppError;

/// Buyer contact details for a reservation. One per reservation, enforced by
/// the primary key on `reservation`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Completion {
    pub reservation: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub society: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompletion {
    pub reservation: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub society: String,
}

impl NewCompletion {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty()
            || self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
        {
            return Err(AppError::ValidationError(
                "completion does not pass validation".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete a reservation: personalize all its tickets to the buyer and
/// insert the completion row, in one transaction. A second completion for the
/// same reservation trips the uniqueness constraint and surfaces as
/// `Conflict`, which guards against double submits.
pub async fn create_completion(pool: &PgPool, new: &NewCompletion) -> Result<Completion, AppError> {
    let mut tx = pool.begin().await?;

    // Initial personalization: establishes the first owner without bumping
    // the counter, so the first QR tokens issued stay valid.
    ticket::personalize_by_reservation(
        &mut tx,
        new.reservation,
        &new.email,
        &new.first_name,
        &new.last_name,
        &new.society,
    )
    .await?;

    let completion = sqlx::query_as::<_, Completion>(
        r#"
        INSERT INTO completions (reservation, email, first_name, last_name, society, created_at)
        VALUES ($1, $2, $3, $4, $5, DEFAULT)
        RETURNING reservation, email, first_name, last_name, society, created_at
        "#,
    )
    .bind(new.reservation)
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.society)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if AppError::is_unique_violation(&e) {
            AppError::Conflict("reservation already completed".to_string())
        } else {
            AppError::DatabaseError(e)
        }
    })?;

    tx.commit().await?;
    Ok(completion)
}

pub async fn get_all_completions(pool: &PgPool) -> Result<Vec<Completion>, AppError> {
    let rows = sqlx::query_as::<_, Completion>(
        "SELECT reservation, email, first_name, last_name, society, created_at FROM completions",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `None` means "not completed yet", an expected state while a buyer is
/// mid-checkout.
pub async fn get_completion_for_reservation(
    pool: &PgPool,
    reservation: Uuid,
) -> Result<Option<Completion>, AppError> {
    let row = sqlx::query_as::<_, Completion>(
        r#"
        SELECT reservation, email, first_name, last_name, society, created_at
        FROM completions
        WHERE reservation = $1
        "#,
    )
    .bind(reservation)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NewCompletion {
        NewCompletion {
            reservation: Uuid::new_v4(),
            email: "buyer@example.com".to_string(),
            first_name: "Bo".to_string(),
            last_name: "de Vries".to_string(),
            society: String::new(),
        }
    }

    #[test]
    fn test_valid_completion_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_blank_email_fails() {
        let mut c = base();
        c.email = "   ".to_string();
        assert!(matches!(c.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_missing_last_name_fails() {
        let mut c = base();
        c.last_name = String::new();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_society_defaults_to_empty() {
        let parsed: NewCompletion = serde_json::from_value(serde_json::json!({
            "reservation": Uuid::new_v4(),
            "email": "buyer@example.com",
            "first_name": "Bo",
            "last_name": "de Vries"
        }))
        .unwrap();
        assert_eq!(parsed.society, "");
        assert!(parsed.validate().is_ok());
    }
}
