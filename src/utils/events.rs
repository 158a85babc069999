//! Commit notifications.
//!
//! One event is published per successful reservation or payment commit; any
//! transport (poll, push, socket) can subscribe. The core never depends on a
//! particular consumer.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ShopEvent {
    ReservationCreated { reservation: Uuid },
    PaymentConfirmed { reservation: Uuid },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ShopEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget: publishing with no subscribers is not an error.
    pub fn publish(&self, event: ShopEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(?event, "no subscribers for shop event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let reservation = Uuid::new_v4();
        bus.publish(ShopEvent::ReservationCreated { reservation });

        assert_eq!(
            rx.recv().await.unwrap(),
            ShopEvent::ReservationCreated { reservation }
        );
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(ShopEvent::PaymentConfirmed {
            reservation: Uuid::new_v4(),
        });
    }
}
