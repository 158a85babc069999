//! Background sweep that releases expired reservations.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::reservation;

/// Spawn the periodic cleanup task. Each tick deletes completions without a
/// payment and reservations without a completion once their hold window has
/// elapsed; released ticket rows return capacity to the inventory by virtue
/// of no longer existing. Sweep errors are logged and retried on the next
/// tick.
pub fn spawn_cleanup_task(pool: PgPool, hold: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match reservation::delete_expired(&pool, hold).await {
                Ok((completions, reservations)) => {
                    if completions > 0 || reservations > 0 {
                        tracing::info!(
                            reservations,
                            completions,
                            "cleaned up expired reservations"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "cleanup sweep failed");
                }
            }
        }
    })
}
