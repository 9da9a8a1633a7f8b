//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway::route(identity)
//!     → RateLimiter::is_allowed(key)
//!         - token_bucket.rs (burst up to capacity, steady refill)
//!         - sliding_window.rs (exact count over a trailing window)
//!         - hybrid.rs (window first, then bucket)
//!     → admitted or RateLimited
//!
//! Background:
//!     sweeper.rs → RateLimiter::evict_idle (bounded memory)
//! ```
//!
//! # Design Decisions
//! - One record per identity, created lazily on first observation
//! - Records live in a sharded map; one identity's updates are serialized,
//!   different identities do not contend on a single lock
//! - No strategy returns errors; identifiers are opaque keys
//! - Time comes from an injected Clock, never from timers

pub mod hybrid;
pub mod sliding_window;
pub mod sweeper;
pub mod token_bucket;

use std::sync::Arc;

use crate::clock::{Clock, Millis};
use crate::config::{RateLimitConfig, RateLimitStrategy};

pub use hybrid::HybridLimiter;
pub use sliding_window::SlidingWindowLimiter;
pub use sweeper::LimiterSweeper;
pub use token_bucket::TokenBucketLimiter;

/// Decides whether an identifier may proceed now.
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    /// Records the attempt if, and only if, it is admitted.
    fn is_allowed(&self, identifier: &str) -> bool;

    /// Forget everything about one identifier.
    fn reset(&self, identifier: &str);

    /// Remaining quota, for strategies that have a countable one.
    fn remaining(&self, identifier: &str) -> Option<u32>;

    /// Drop records untouched for at least `idle_for` whose removal cannot
    /// change a future decision. Returns how many were dropped.
    fn evict_idle(&self, idle_for: Millis) -> usize;

    /// Number of identifiers currently tracked.
    fn tracked(&self) -> usize;
}

/// Build the configured strategy.
pub fn build_limiter(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Arc<dyn RateLimiter> {
    match config.strategy {
        RateLimitStrategy::TokenBucket => Arc::new(TokenBucketLimiter::new(
            config.capacity,
            config.refill_per_sec,
            clock,
        )),
        RateLimitStrategy::SlidingWindow => Arc::new(SlidingWindowLimiter::new(
            config.max_requests,
            config.window_ms,
            clock,
        )),
        RateLimitStrategy::Hybrid => Arc::new(HybridLimiter::new(
            config.max_requests,
            config.window_ms,
            config.burst_size,
            clock,
        )),
    }
}
