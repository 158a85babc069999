use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_RESERVATION_VALID_FOR_MS: u64 = 600_000;
const DEFAULT_CLEANUP_EVERY_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// How long a reservation holds its tickets before the cleanup task may
    /// release them.
    pub reservation_valid_for: Duration,
    /// Interval between cleanup sweeps.
    pub cleanup_every: Duration,
    /// 32-byte AES-256 key for QR tokens.
    pub qr_key: Vec<u8>,
    /// HS512 signing key for admin tokens.
    pub jwt_secret: String,
    pub admin_username: String,
    /// bcrypt hash of the admin password.
    pub admin_password_hash: String,
    pub mollie_token: String,
    pub mollie_description: String,
    /// Public base URL of this server (webhook target).
    pub server_host: String,
    /// Base URL of the client (payment redirect target).
    pub client_host: String,
    /// SendGrid API token; mail delivery is skipped when absent.
    pub sendgrid_token: Option<String>,
    /// Sender address for ticket mails.
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let reservation_valid_for = duration_ms_from_env(
            "RESERVATION_VALID_FOR_MS",
            DEFAULT_RESERVATION_VALID_FOR_MS,
        )?;
        let cleanup_every = duration_ms_from_env("CLEANUP_EVERY_MS", DEFAULT_CLEANUP_EVERY_MS)?;

        let qr_key_b64 =
            env::var("QR_SECRET_KEY").map_err(|_| ConfigError::Missing("QR_SECRET_KEY"))?;
        let qr_key = BASE64
            .decode(qr_key_b64.trim())
            .map_err(|_| ConfigError::Invalid("QR_SECRET_KEY"))?;
        if qr_key.len() != 32 {
            return Err(ConfigError::Invalid("QR_SECRET_KEY"));
        }

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let admin_username =
            env::var("ADMIN_USERNAME").map_err(|_| ConfigError::Missing("ADMIN_USERNAME"))?;
        let admin_password_hash =
            env::var("ADMIN_PASSWORD").map_err(|_| ConfigError::Missing("ADMIN_PASSWORD"))?;

        let mollie_token =
            env::var("MOLLIE_TOKEN").map_err(|_| ConfigError::Missing("MOLLIE_TOKEN"))?;
        let mollie_description =
            env::var("MOLLIE_DESCRIPTION").unwrap_or_else(|_| "payment".to_string());

        let server_host =
            env::var("HOST").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let client_host =
            env::var("CLIENT").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let sendgrid_token = env::var("SENDGRID_TOKEN").ok();
        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "tickets@localhost".to_string());

        Ok(Self {
            database_url,
            port,
            reservation_valid_for,
            cleanup_every,
            qr_key,
            jwt_secret,
            admin_username,
            admin_password_hash,
            mollie_token,
            mollie_description,
            server_host,
            client_host,
            sendgrid_token,
            mail_from,
        })
    }
}

fn duration_ms_from_env(key: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let ms = match env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(key))?,
        Err(_) => default_ms,
    };
    Ok(Duration::from_millis(ms))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
