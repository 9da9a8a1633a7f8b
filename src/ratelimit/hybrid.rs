//! Hybrid admission: a sliding window gated by a token bucket.
//!
//! The window is the primary gate and is always evaluated first. The bucket
//! is only consulted when the window admits, so a window rejection never
//! consumes a token. When the window admits and the bucket rejects, the
//! window keeps its recorded timestamp.

use std::sync::Arc;

use crate::clock::{Clock, Millis};
use crate::ratelimit::{RateLimiter, SlidingWindowLimiter, TokenBucketLimiter};

#[derive(Debug)]
pub struct HybridLimiter {
    window: SlidingWindowLimiter,
    bucket: TokenBucketLimiter,
}

impl HybridLimiter {
    /// The bucket refills at the window's average rate, `max_requests` per
    /// `window_ms`, and holds at most `burst` tokens.
    pub fn new(max_requests: u32, window_ms: Millis, burst: u32, clock: Arc<dyn Clock>) -> Self {
        let window_secs = (window_ms as f64 / 1000.0).max(f64::EPSILON);
        let refill = max_requests as f64 / window_secs;

        Self {
            window: SlidingWindowLimiter::new(max_requests, window_ms, clock.clone()),
            bucket: TokenBucketLimiter::new(burst, refill, clock),
        }
    }

    pub fn window(&self) -> &SlidingWindowLimiter {
        &self.window
    }

    pub fn bucket(&self) -> &TokenBucketLimiter {
        &self.bucket
    }
}

impl RateLimiter for HybridLimiter {
    fn is_allowed(&self, identifier: &str) -> bool {
        self.window.is_allowed(identifier) && self.bucket.is_allowed(identifier)
    }

    fn reset(&self, identifier: &str) {
        self.window.reset(identifier);
        self.bucket.reset(identifier);
    }

    fn remaining(&self, identifier: &str) -> Option<u32> {
        self.window.remaining(identifier)
    }

    fn evict_idle(&self, idle_for: Millis) -> usize {
        self.window.evict_idle(idle_for) + self.bucket.evict_idle(idle_for)
    }

    fn tracked(&self) -> usize {
        self.window.tracked().max(self.bucket.tracked())
    }
}
