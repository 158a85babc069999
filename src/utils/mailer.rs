//! Ticket delivery by mail.
//!
//! The mail body and PDF rendering are deliberately minimal; what matters to
//! the core is the contract: one call delivers tickets for exactly one owner,
//! each carrying a freshly encoded QR token.

use reqwest::Client;
use serde_json::json;

use crate::models::ticket::Ticket;
use crate::utils::error::AppError;
use crate::utils::qr::QrCodec;

const SENDGRID_SEND_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Clone)]
pub struct Mailer {
    http: Client,
    /// Mail delivery is disabled (logged and skipped) when no token is set.
    token: Option<String>,
    from: String,
}

impl Mailer {
    pub fn new(token: Option<String>, from: String) -> Self {
        Self {
            http: Client::new(),
            token,
            from,
        }
    }

    /// Send all given tickets in one mail to their owner.
    ///
    /// Precondition: every ticket must have the same owner; one call means
    /// one recipient. Mixed batches are a caller bug and fail before any
    /// network traffic.
    pub async fn send_tickets(
        &self,
        codec: &QrCodec,
        tickets: &[Ticket],
        repersonalized: bool,
    ) -> Result<(), AppError> {
        let Some(first) = tickets.first() else {
            return Ok(());
        };

        let same_owner = tickets.iter().all(|t| {
            t.owner_email == first.owner_email
                && t.owner_first_name == first.owner_first_name
                && t.owner_last_name == first.owner_last_name
                && t.owner_society == first.owner_society
        });
        if !same_owner {
            return Err(AppError::InternalServerError(
                "send_tickets expects all tickets to have the same owner".to_string(),
            ));
        }

        let mut lines = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let token = codec.encode(ticket.id, ticket.owner_counter)?;
            let name = ticket.ticket_name.as_deref().unwrap_or("ticket");
            lines.push(format!("{name}: {token}"));
        }

        let Some(api_token) = &self.token else {
            tracing::info!(
                recipient = %first.owner_email,
                tickets = tickets.len(),
                repersonalized,
                "mail delivery disabled, skipping ticket mail"
            );
            return Ok(());
        };

        let subject = if repersonalized {
            "Your ticket was transferred to you"
        } else {
            "Your tickets"
        };

        let body = json!({
            "personalizations": [{
                "to": [{ "email": first.owner_email, "name": first.owner_first_name }]
            }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{
                "type": "text/plain",
                "value": format!(
                    "Hi {},\n\nHere are your tickets:\n\n{}\n",
                    first.owner_first_name,
                    lines.join("\n")
                )
            }]
        });

        let response = self
            .http
            .post(SENDGRID_SEND_ENDPOINT)
            .bearer_auth(api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("mail send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "mail send rejected with status {}",
                response.status()
            )));
        }

        tracing::info!(
            recipient = %first.owner_email,
            tickets = tickets.len(),
            repersonalized,
            "ticket mail sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ticket(email: &str) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            reservation: Uuid::new_v4(),
            ticket_type: Uuid::new_v4(),
            ticket_name: Some("Entry".to_string()),
            price: Some(1250),
            owner_counter: 0,
            owner_email: email.to_string(),
            owner_first_name: "Alice".to_string(),
            owner_last_name: "Jansen".to_string(),
            owner_society: String::new(),
        }
    }

    fn codec() -> QrCodec {
        QrCodec::new(&[1u8; 32]).unwrap()
    }

    #[tokio::test]
    async fn test_mixed_owner_batch_is_rejected() {
        let mailer = Mailer::new(None, "tickets@localhost".to_string());
        let batch = vec![ticket("a@example.com"), ticket("b@example.com")];
        assert!(mailer.send_tickets(&codec(), &batch, false).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let mailer = Mailer::new(None, "tickets@localhost".to_string());
        assert!(mailer.send_tickets(&codec(), &[], false).await.is_ok());
    }

    #[tokio::test]
    async fn test_same_owner_batch_without_token_is_skipped() {
        // No SendGrid token configured: the call succeeds without network IO
        let mailer = Mailer::new(None, "tickets@localhost".to_string());
        let batch = vec![ticket("a@example.com"), ticket("a@example.com")];
        assert!(mailer.send_tickets(&codec(), &batch, true).await.is_ok());
    }
}
