//! Shop-open state behind a small interface instead of mutable process
//! environment, so the gate can be exercised in tests without global side
//! effects.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    pub open: bool,
    /// Epoch milliseconds at which the shop opens automatically; 0 disables
    /// the countdown.
    pub opens_at_timestamp: i64,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            open: false,
            opens_at_timestamp: 0,
        }
    }
}

#[derive(Clone, Default)]
pub struct SettingsStore {
    inner: Arc<RwLock<ShopSettings>>,
}

impl SettingsStore {
    pub fn new(initial: ShopSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Current settings; flips the shop open once the countdown has passed.
    pub async fn get(&self) -> ShopSettings {
        {
            let current = *self.inner.read().await;
            let countdown_passed = !current.open
                && current.opens_at_timestamp > 0
                && current.opens_at_timestamp < Utc::now().timestamp_millis();
            if !countdown_passed {
                return current;
            }
        }

        let mut current = self.inner.write().await;
        // Re-check under the write lock, another task may have flipped it
        if !current.open
            && current.opens_at_timestamp > 0
            && current.opens_at_timestamp < Utc::now().timestamp_millis()
        {
            current.open = true;
            current.opens_at_timestamp = 0;
            tracing::info!("shop opened by countdown");
        }
        *current
    }

    pub async fn set(&self, settings: ShopSettings) -> ShopSettings {
        let mut current = self.inner.write().await;
        *current = settings;
        *current
    }

    pub async fn is_open(&self) -> bool {
        self.get().await.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shop_is_closed_by_default() {
        let store = SettingsStore::default();
        assert!(!store.is_open().await);
    }

    #[tokio::test]
    async fn test_set_opens_the_shop() {
        let store = SettingsStore::default();
        store
            .set(ShopSettings {
                open: true,
                opens_at_timestamp: 0,
            })
            .await;
        assert!(store.is_open().await);
    }

    #[tokio::test]
    async fn test_countdown_in_the_past_opens_the_shop() {
        let store = SettingsStore::new(ShopSettings {
            open: false,
            opens_at_timestamp: Utc::now().timestamp_millis() - 1000,
        });
        let settings = store.get().await;
        assert!(settings.open);
        assert_eq!(settings.opens_at_timestamp, 0);
    }

    #[tokio::test]
    async fn test_countdown_in_the_future_keeps_the_shop_closed() {
        let store = SettingsStore::new(ShopSettings {
            open: false,
            opens_at_timestamp: Utc::now().timestamp_millis() + 60_000,
        });
        assert!(!store.is_open().await);
    }
}
