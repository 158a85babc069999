use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::Config;
use crate::utils::error::AppError;
use crate::utils::events::EventBus;
use crate::utils::mailer::Mailer;
use crate::utils::mollie::MollieClient;
use crate::utils::qr::QrCodec;
use crate::utils::settings::SettingsStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub qr: QrCodec,
    pub settings: SettingsStore,
    pub mollie: Arc<MollieClient>,
    pub mailer: Arc<Mailer>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self, AppError> {
        let qr = QrCodec::new(&config.qr_key)?;
        let mollie = Arc::new(MollieClient::new(&config));
        let mailer = Arc::new(Mailer::new(
            config.sendgrid_token.clone(),
            config.mail_from.clone(),
        ));

        Ok(Self {
            pool,
            qr,
            settings: SettingsStore::default(),
            mollie,
            mailer,
            events: EventBus::default(),
            config: Arc::new(config),
        })
    }

    /// The configured reservation hold duration.
    pub fn hold(&self) -> Duration {
        self.config.reservation_valid_for
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
