use axum::{
    routing::{get, post},
    Router,
};

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    auth, completions, health_check, payments, reservations, settings, statistics, ticket_scans,
    ticket_types, tickets,
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/token", post(auth::create_token))
        .route(
            "/ticket_types",
            get(ticket_types::list).post(ticket_types::create),
        )
        .route(
            "/ticket_types/:id",
            get(ticket_types::get_one)
                .put(ticket_types::update)
                .delete(ticket_types::delete),
        )
        .route(
            "/reservations",
            get(reservations::list).post(reservations::create),
        )
        .route("/reservations/:id", get(reservations::get_one))
        .route(
            "/completions",
            get(completions::list).post(completions::create),
        )
        .route("/completions/:reservation", get(completions::get_one))
        .route("/payments", get(payments::list))
        .route(
            "/payments/:reservation",
            get(payments::get_one).post(payments::create),
        )
        .route("/payments/:reservation/webhook", post(payments::webhook))
        .route("/ticket_scans", post(ticket_scans::scan))
        .route("/tickets", get(tickets::list))
        .route("/tickets/:id", get(tickets::get_one).put(tickets::update))
        .route("/statistics", get(statistics::get_statistics))
        .route(
            "/settings/open",
            get(settings::get_open).put(settings::put_open),
        )
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
