//! Periodic eviction of idle limiter records.
//!
//! Limiter records are created on first sight of an identity and nothing
//! else removes them, so a long-running gateway needs this task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;
use crate::ratelimit::RateLimiter;

pub struct LimiterSweeper {
    limiter: Arc<dyn RateLimiter>,
    interval: Duration,
    idle_ttl: Duration,
}

impl LimiterSweeper {
    pub fn new(limiter: Arc<dyn RateLimiter>, interval: Duration, idle_ttl: Duration) -> Self {
        Self {
            limiter,
            interval,
            idle_ttl,
        }
    }

    /// Run one sweep, returning the number of evicted records.
    pub fn sweep(&self) -> usize {
        let evicted = self.limiter.evict_idle(self.idle_ttl.as_millis() as u64);
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.limiter.tracked(),
                "Evicted idle rate limiter records"
            );
        }
        metrics::record_limiter_sweep(evicted, self.limiter.tracked());
        evicted
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Rate limiter sweeping disabled");
            return;
        }

        tracing::info!(
            interval = ?self.interval,
            idle_ttl = ?self.idle_ttl,
            "Rate limiter sweeper starting"
        );

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limiter sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ratelimit::SlidingWindowLimiter;

    #[test]
    fn test_sweep_evicts_idle_records() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = Arc::new(SlidingWindowLimiter::new(5, 1_000, clock.clone()));
        for id in ["a", "b", "c"] {
            limiter.is_allowed(id);
        }

        let sweeper = LimiterSweeper::new(
            limiter.clone(),
            Duration::from_secs(1),
            Duration::from_secs(10),
        );

        clock.set(5_000);
        assert_eq!(sweeper.sweep(), 0);

        limiter.is_allowed("c");
        clock.set(12_000);
        assert_eq!(sweeper.sweep(), 2);
        assert_eq!(limiter.tracked(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = Arc::new(SlidingWindowLimiter::new(5, 1_000, clock));
        let sweeper = LimiterSweeper::new(
            limiter,
            Duration::from_millis(10),
            Duration::from_secs(1),
        );

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(sweeper.run(rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should exit")
            .unwrap();
    }
}
