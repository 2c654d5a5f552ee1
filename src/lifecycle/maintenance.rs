//! Periodic housekeeping for in-memory state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::admin::SessionStore;
use crate::security::RateLimiter;

/// Sweep expired sessions and idle rate-limit windows every `every` until
/// `shutdown` fires.
pub fn spawn(
    sessions: Arc<SessionStore>,
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sessions_purged = sessions.purge_expired();
                    let clients_dropped = limiter.sweep();
                    tracing::debug!(
                        sessions_purged,
                        clients_dropped,
                        active_sessions = sessions.len(),
                        "Maintenance sweep"
                    );
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_purges_and_stops_on_shutdown() {
        let sessions = Arc::new(SessionStore::new("4545", Duration::from_secs(60)));
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig::default()));
        sessions.issue();

        let (tx, rx) = broadcast::channel(1);
        let handle = spawn(sessions.clone(), limiter, Duration::from_secs(120), rx);

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert!(sessions.is_empty());

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
