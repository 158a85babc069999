//! Shape validation of the public input types and the expiry boundary.

use std::collections::HashMap;
use std::time::Duration;

use bae_shop_server::models::completion::NewCompletion;
use bae_shop_server::models::reservation::{self, NewReservation};
use bae_shop_server::models::ticket_type::NewTicketType;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// NewReservation
// ============================================================================

#[test]
fn test_reservation_request_deserializes_from_map() {
    let id = Uuid::new_v4();
    let req: NewReservation = serde_json::from_value(json!({ id.to_string(): 2 })).unwrap();
    assert!(req.validate().is_ok());
    assert_eq!(req.0[&id], 2);
}

#[test]
fn test_empty_reservation_request_is_rejected() {
    let req: NewReservation = serde_json::from_value(json!({})).unwrap();
    assert!(req.validate().is_err());
}

#[test]
fn test_non_numeric_amount_fails_to_deserialize() {
    let result: Result<NewReservation, _> =
        serde_json::from_value(json!({ Uuid::new_v4().to_string(): "two" }));
    assert!(result.is_err());
}

#[test]
fn test_non_uuid_key_fails_to_deserialize() {
    let result: Result<NewReservation, _> = serde_json::from_value(json!({ "entry": 1 }));
    assert!(result.is_err());
}

#[test]
fn test_zero_and_negative_amounts_are_rejected() {
    for amount in [0i64, -1, -100] {
        let mut map = HashMap::new();
        map.insert(Uuid::new_v4(), amount);
        assert!(
            NewReservation(map).validate().is_err(),
            "amount {amount} should be rejected"
        );
    }
}

#[test]
fn test_multi_type_request_is_accepted() {
    let req: NewReservation = serde_json::from_value(json!({
        Uuid::new_v4().to_string(): 1,
        Uuid::new_v4().to_string(): 4,
    }))
    .unwrap();
    assert!(req.validate().is_ok());
}

// ============================================================================
// NewCompletion / NewTicketType
// ============================================================================

#[test]
fn test_completion_requires_contact_fields() {
    let missing_email: Result<NewCompletion, _> = serde_json::from_value(json!({
        "reservation": Uuid::new_v4(),
        "first_name": "Bo",
        "last_name": "de Vries"
    }));
    assert!(missing_email.is_err());

    let blank: NewCompletion = serde_json::from_value(json!({
        "reservation": Uuid::new_v4(),
        "email": "",
        "first_name": "Bo",
        "last_name": "de Vries"
    }))
    .unwrap();
    assert!(blank.validate().is_err());
}

#[test]
fn test_ticket_type_shape() {
    let tt: NewTicketType = serde_json::from_value(json!({
        "name": "Entry",
        "description": "General admission",
        "price": 1250,
        "amount_available": 400
    }))
    .unwrap();
    assert!(tt.validate().is_ok());

    let negative: NewTicketType = serde_json::from_value(json!({
        "name": "Entry",
        "description": "",
        "price": -1,
        "amount_available": 400
    }))
    .unwrap();
    assert!(negative.validate().is_err());
}

// ============================================================================
// Expiry boundary
// ============================================================================

#[test]
fn test_hold_window_boundary_is_inclusive() {
    let hold = Duration::from_millis(600_000);
    let created = Utc::now();
    let until = reservation::valid_until(created, hold);

    assert!(!reservation::is_expired_at(
        created,
        hold,
        until - chrono::Duration::milliseconds(1)
    ));
    assert!(reservation::is_expired_at(created, hold, until));
    assert!(reservation::is_expired_at(
        created,
        hold,
        until + chrono::Duration::milliseconds(1)
    ));
}

#[test]
fn test_different_hold_durations_shift_the_boundary() {
    let created = Utc::now();
    let short = Duration::from_secs(60);
    let long = Duration::from_secs(3600);

    let t = created + chrono::Duration::minutes(5);
    assert!(reservation::is_expired_at(created, short, t));
    assert!(!reservation::is_expired_at(created, long, t));
}
