pub mod auth;
pub mod cleanup;
pub mod error;
pub mod events;
pub mod mailer;
pub mod mollie;
pub mod qr;
pub mod response;
pub mod settings;
