//! Sliding window admission.
//!
//! Counts admitted requests inside the trailing `window` exactly, with no
//! double counting at window boundaries. Cost is proportional to the number
//! of requests currently in the window.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::clock::{Clock, Millis};
use crate::ratelimit::RateLimiter;

#[derive(Debug, Default)]
struct Window {
    /// Admission times, oldest first.
    hits: VecDeque<Millis>,
    last_seen: Millis,
}

impl Window {
    fn prune(&mut self, now: Millis, window: Millis) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_sub(oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn try_admit(&mut self, limit: u32, window: Millis, now: Millis) -> bool {
        self.prune(now, window);
        self.last_seen = now;

        if self.hits.len() < limit as usize {
            self.hits.push_back(now);
            true
        } else {
            false
        }
    }

    fn live(&self, window: Millis, now: Millis) -> usize {
        self.hits
            .iter()
            .filter(|&&t| now.saturating_sub(t) < window)
            .count()
    }
}

/// Per-identifier sliding windows.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window_ms: Millis,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: u32, window_ms: Millis, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window_ms,
            clock,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_ms(&self) -> Millis {
        self.window_ms
    }

    /// Requests still available in the current window. Never mutates state.
    pub fn get_remaining(&self, identifier: &str) -> u32 {
        let now = self.clock.now();
        let used = self
            .windows
            .get(identifier)
            .map(|w| w.live(self.window_ms, now))
            .unwrap_or(0);
        (self.max_requests as usize).saturating_sub(used) as u32
    }

    /// Number of timestamps retained for an identifier.
    pub fn retained(&self, identifier: &str) -> usize {
        self.windows
            .get(identifier)
            .map(|w| w.hits.len())
            .unwrap_or(0)
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn is_allowed(&self, identifier: &str) -> bool {
        let now = self.clock.now();

        if let Some(mut window) = self.windows.get_mut(identifier) {
            return window.try_admit(self.max_requests, self.window_ms, now);
        }

        match self.windows.entry(identifier.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry
                    .get_mut()
                    .try_admit(self.max_requests, self.window_ms, now)
            }
            Entry::Vacant(entry) => entry
                .insert(Window::default())
                .try_admit(self.max_requests, self.window_ms, now),
        }
    }

    fn reset(&self, identifier: &str) {
        self.windows.remove(identifier);
    }

    fn remaining(&self, identifier: &str) -> Option<u32> {
        Some(self.get_remaining(identifier))
    }

    fn evict_idle(&self, idle_for: Millis) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        // Records with live hits are kept regardless of idleness.
        let threshold = idle_for.max(self.window_ms);
        self.windows
            .retain(|_, window| now.saturating_sub(window.last_seen) < threshold);
        before.saturating_sub(self.windows.len())
    }

    fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(limit: u32, window: Millis) -> (Arc<ManualClock>, SlidingWindowLimiter) {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = SlidingWindowLimiter::new(limit, window, clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_window_is_exact() {
        let (clock, limiter) = limiter(3, 1_000);

        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("a"));

        clock.set(500);
        assert!(!limiter.is_allowed("a"));

        clock.set(1_001);
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let (clock, limiter) = limiter(1, 1_000);

        assert!(limiter.is_allowed("a"));
        clock.set(999);
        assert!(!limiter.is_allowed("a"));
        clock.set(1_000);
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_retained_timestamps_are_inside_window() {
        let (clock, limiter) = limiter(10, 1_000);

        for t in [0, 100, 200, 900, 1_150, 1_800, 2_500] {
            clock.set(t);
            limiter.is_allowed("a");
            let window = limiter.windows.get("a").unwrap();
            assert!(window.hits.iter().all(|&hit| t - hit < 1_000));
        }
        assert_eq!(limiter.retained("a"), 2);
    }

    #[test]
    fn test_rejections_are_not_recorded() {
        let (_, limiter) = limiter(2, 1_000);

        for _ in 0..5 {
            limiter.is_allowed("a");
        }
        assert_eq!(limiter.retained("a"), 2);
    }

    #[test]
    fn test_get_remaining_is_read_only() {
        let (clock, limiter) = limiter(3, 1_000);

        assert_eq!(limiter.get_remaining("a"), 3);
        assert_eq!(limiter.tracked(), 0, "reading must not create a record");

        limiter.is_allowed("a");
        limiter.is_allowed("a");
        assert_eq!(limiter.get_remaining("a"), 1);

        clock.set(1_500);
        assert_eq!(limiter.get_remaining("a"), 3);
        assert_eq!(limiter.retained("a"), 2, "reading must not prune");
    }

    #[test]
    fn test_reset_and_independence() {
        let (_, limiter) = limiter(1, 60_000);

        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));

        limiter.reset("a");
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_evict_idle_keeps_live_windows() {
        let (clock, limiter) = limiter(5, 1_000);

        limiter.is_allowed("a");
        clock.set(500);
        limiter.is_allowed("b");

        clock.set(1_200);
        assert_eq!(limiter.evict_idle(100), 1);
        assert_eq!(limiter.retained("a"), 0);
        assert_eq!(limiter.retained("b"), 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_window() {
        let (_, limiter) = limiter(30, 1_000);
        let admitted = std::sync::atomic::AtomicU32::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..30 {
                        if limiter.is_allowed("a") {
                            admitted.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.into_inner(), 30);
        assert_eq!(limiter.retained("a"), 30);
    }
}
