//! Mollie payment provider client.
//!
//! The webhook only carries a payment id; the actual status is always
//! re-fetched from the API and never trusted from the webhook payload.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::utils::error::AppError;

const MOLLIE_PAYMENTS_ENDPOINT: &str = "https://api.mollie.com/v2/payments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MollieStatus {
    Open,
    Canceled,
    Pending,
    Authorized,
    Expired,
    Failed,
    Paid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MollieLink {
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MollieLinks {
    pub checkout: Option<MollieLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MolliePayment {
    pub id: String,
    pub status: Option<MollieStatus>,
    #[serde(rename = "_links", default)]
    pub links: MollieLinks,
}

impl MolliePayment {
    pub fn checkout_url(&self) -> Option<&str> {
        self.links.checkout.as_ref().map(|l| l.href.as_str())
    }

    pub fn is_paid(&self) -> bool {
        self.status == Some(MollieStatus::Paid)
    }
}

/// Format minor currency units the way the Mollie API expects ("12.50").
fn eur_value(amount_cents: i64) -> String {
    format!("{}.{:02}", amount_cents / 100, amount_cents % 100)
}

#[derive(Clone)]
pub struct MollieClient {
    http: Client,
    token: String,
    description: String,
    server_host: String,
    client_host: String,
}

impl MollieClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            token: config.mollie_token.clone(),
            description: config.mollie_description.clone(),
            server_host: config.server_host.clone(),
            client_host: config.client_host.clone(),
        }
    }

    /// Create a payment at the provider; the returned checkout URL is where
    /// the buyer finishes paying. Mollie will confirm via the webhook URL.
    pub async fn create_payment(
        &self,
        reservation: Uuid,
        amount_cents: i64,
    ) -> Result<MolliePayment, AppError> {
        let body = json!({
            "amount": { "currency": "EUR", "value": eur_value(amount_cents) },
            "description": self.description,
            "redirectUrl": format!("{}/baedankt/", self.client_host),
            "method": ["ideal"],
            "webhookUrl": format!("{}/payments/{}/webhook", self.server_host, reservation),
        });

        let response = self
            .http
            .post(MOLLIE_PAYMENTS_ENDPOINT)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("mollie create failed: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("mollie response invalid: {e}")))
    }

    pub async fn fetch_payment(&self, payment_id: &str) -> Result<MolliePayment, AppError> {
        let response = self
            .http
            .get(format!("{MOLLIE_PAYMENTS_ENDPOINT}/{payment_id}"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("mollie fetch failed: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("mollie response invalid: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eur_value_formatting() {
        assert_eq!(eur_value(1250), "12.50");
        assert_eq!(eur_value(5), "0.05");
        assert_eq!(eur_value(100), "1.00");
        assert_eq!(eur_value(0), "0.00");
    }

    #[test]
    fn test_status_deserializes_lowercase() {
        let payment: MolliePayment = serde_json::from_value(json!({
            "id": "tr_abc123",
            "status": "paid",
            "_links": { "checkout": { "href": "https://pay.example/x" } }
        }))
        .unwrap();
        assert!(payment.is_paid());
        assert_eq!(payment.checkout_url(), Some("https://pay.example/x"));
    }

    #[test]
    fn test_missing_status_and_links_are_tolerated() {
        let payment: MolliePayment =
            serde_json::from_value(json!({ "id": "tr_abc123" })).unwrap();
        assert!(!payment.is_paid());
        assert_eq!(payment.checkout_url(), None);
    }

    #[test]
    fn test_unpaid_statuses_are_not_paid() {
        for status in ["open", "canceled", "pending", "authorized", "expired", "failed"] {
            let payment: MolliePayment =
                serde_json::from_value(json!({ "id": "tr_x", "status": status })).unwrap();
            assert!(!payment.is_paid(), "status {status} must not count as paid");
        }
    }
}
