//! Token bucket admission.
//!
//! Smooths the sustained rate to `refill_per_sec` while allowing bursts up
//! to `capacity`. Each identifier owns one bucket, created full on first
//! sight.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::clock::{Clock, Millis};
use crate::ratelimit::RateLimiter;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Millis,
}

impl Bucket {
    fn refill(&mut self, capacity: f64, refill_rate: f64, now: Millis) {
        let elapsed = now.saturating_sub(self.last_refill) as f64 / 1000.0;
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Millis) -> bool {
        self.refill(capacity, refill_rate, now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens this bucket would hold at `now`, without touching it.
    fn projected(&self, capacity: f64, refill_rate: f64, now: Millis) -> f64 {
        let elapsed = now.saturating_sub(self.last_refill) as f64 / 1000.0;
        (self.tokens + elapsed * refill_rate).min(capacity)
    }
}

/// Per-identifier token buckets.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    buckets: DashMap<String, Bucket>,
    capacity: f64,
    refill_per_sec: f64,
    clock: Arc<dyn Clock>,
}

impl TokenBucketLimiter {
    pub fn new(capacity: u32, refill_per_sec: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity: capacity as f64,
            refill_per_sec: refill_per_sec.max(0.0),
            clock,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_per_sec(&self) -> f64 {
        self.refill_per_sec
    }

    /// Stored token count for an identifier, as of its last refill.
    pub fn tokens(&self, identifier: &str) -> Option<f64> {
        self.buckets.get(identifier).map(|b| b.tokens)
    }
}

impl RateLimiter for TokenBucketLimiter {
    fn is_allowed(&self, identifier: &str) -> bool {
        let now = self.clock.now();

        // Fast path avoids allocating the key for known identifiers.
        if let Some(mut bucket) = self.buckets.get_mut(identifier) {
            return bucket.try_acquire(self.capacity, self.refill_per_sec, now);
        }

        match self.buckets.entry(identifier.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry
                    .get_mut()
                    .try_acquire(self.capacity, self.refill_per_sec, now)
            }
            Entry::Vacant(entry) => {
                let mut bucket = Bucket {
                    tokens: self.capacity,
                    last_refill: now,
                };
                let allowed = bucket.try_acquire(self.capacity, self.refill_per_sec, now);
                entry.insert(bucket);
                allowed
            }
        }
    }

    fn reset(&self, identifier: &str) {
        self.buckets.remove(identifier);
    }

    fn remaining(&self, _identifier: &str) -> Option<u32> {
        None
    }

    fn evict_idle(&self, idle_for: Millis) -> usize {
        let now = self.clock.now();
        let before = self.buckets.len();
        // A bucket is only dropped once it has refilled completely, so a
        // recreated bucket admits exactly as the old one would have.
        self.buckets.retain(|_, bucket| {
            now.saturating_sub(bucket.last_refill) < idle_for
                || bucket.projected(self.capacity, self.refill_per_sec, now) < self.capacity
        });
        before.saturating_sub(self.buckets.len())
    }

    fn tracked(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(capacity: u32, rate: f64) -> (Arc<ManualClock>, TokenBucketLimiter) {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = TokenBucketLimiter::new(capacity, rate, clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_burst_then_reject() {
        let (_, limiter) = limiter(3, 1.0);

        assert!(limiter.is_allowed("a"));
        assert_eq!(limiter.tokens("a"), Some(2.0));
        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        assert_eq!(limiter.tokens("a"), Some(0.0));
    }

    #[test]
    fn test_refill_over_time() {
        let (clock, limiter) = limiter(2, 2.0);

        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));

        clock.advance(250);
        assert!(!limiter.is_allowed("a"), "half a token is not enough");

        clock.advance(250);
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_tokens_stay_within_capacity() {
        let (clock, limiter) = limiter(5, 3.0);
        let steps = [0, 10, 400, 0, 0, 5_000, 1, 1, 1, 333, 60_000, 0, 0, 0, 0, 0, 0];

        for step in steps {
            clock.advance(step);
            limiter.is_allowed("a");
            let tokens = limiter.tokens("a").unwrap();
            assert!((0.0..=5.0).contains(&tokens), "tokens out of range: {tokens}");
        }
    }

    #[test]
    fn test_identifiers_are_independent() {
        let (_, limiter) = limiter(1, 0.1);

        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));
    }

    #[test]
    fn test_reset() {
        let (_, limiter) = limiter(1, 0.1);

        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        limiter.reset("a");
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn test_evicts_only_full_idle_buckets() {
        let (clock, limiter) = limiter(10, 1.0);

        limiter.is_allowed("a");
        clock.advance(5_000);
        limiter.is_allowed("b");

        // "a" refilled after one second, "b" was just touched
        assert_eq!(limiter.evict_idle(1_000), 1);
        assert_eq!(limiter.tokens("a"), None);
        assert!(limiter.tokens("b").is_some());

        // "b" is idle but still one token short of full
        clock.advance(500);
        assert_eq!(limiter.evict_idle(100), 0);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_bucket() {
        let (_, limiter) = limiter(25, 1.0);
        let admitted = std::sync::atomic::AtomicU32::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..25 {
                        if limiter.is_allowed("a") {
                            admitted.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.into_inner(), 25);
        assert_eq!(limiter.tokens("a"), Some(0.0));
    }
}
