//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → breakers.rs (may_attempt: closed, trial, or short-circuit)
//!     → timeouts.rs (enforce request deadline)
//!     → breakers.rs (permit.record: success or transport failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - No internal retries; retry policy belongs to the caller
//! - Circuit breaker prevents cascading failures
//! - Cooldowns are clock comparisons made at call time, not timers

pub mod breakers;
pub mod circuit_breaker;
pub mod timeouts;

pub use breakers::{AttemptPermit, BreakerStatus, CircuitBreakers};
pub use circuit_breaker::{Attempt, CircuitBreaker, CircuitState};
