//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: one trial request tests if the backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures reaches failure_threshold
//! Open → Half-Open: first attempt after the cooldown (checked lazily)
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails (opened_at refreshed)
//! ```
//!
//! # Design Decisions
//! - Per-service circuit breaker (not global)
//! - Fail fast in Open state; rejections do not count as failures
//! - Single trial in Half-Open; concurrent attempts are rejected while it runs
//! - Only transport failures count; any HTTP status is a success
//! - Outcomes of calls admitted before the circuit opened only move the
//!   counter, never the state

use serde::Serialize;

use crate::clock::Millis;
use crate::config::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

/// How a call got through the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Admitted while closed.
    Normal,
    /// The single recovery probe admitted while half-open.
    Trial,
}

/// Failure-isolation state for one service.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Millis>,
    trial_in_flight: bool,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn opened_at(&self) -> Option<Millis> {
        self.opened_at
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Replace thresholds without touching the current state.
    pub fn set_config(&mut self, config: CircuitBreakerConfig) {
        self.config = config;
    }

    /// Decide whether a call may be attempted at `now`.
    ///
    /// Performs the lazy Open → Half-Open transition once the cooldown has
    /// elapsed. Returns `None` when the call must be short-circuited.
    pub fn try_acquire(&mut self, now: Millis) -> Option<Attempt> {
        match self.state {
            CircuitState::Closed => Some(Attempt::Normal),
            CircuitState::Open => {
                let opened_at = self.opened_at.unwrap_or(now);
                let cooldown = self.config.cooldown().as_millis() as u64;
                if now.saturating_sub(opened_at) > cooldown {
                    self.state = CircuitState::HalfOpen;
                    self.trial_in_flight = true;
                    Some(Attempt::Trial)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                if self.trial_in_flight {
                    None
                } else {
                    self.trial_in_flight = true;
                    Some(Attempt::Trial)
                }
            }
        }
    }

    /// Apply the outcome of an attempted call.
    pub fn record(&mut self, attempt: Attempt, success: bool, now: Millis) {
        match (attempt, self.state) {
            (Attempt::Trial, CircuitState::HalfOpen) => {
                self.trial_in_flight = false;
                if success {
                    self.close();
                } else {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    self.open(now);
                }
            }
            (_, CircuitState::Closed) => {
                if success {
                    self.consecutive_failures = 0;
                } else {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    if self.consecutive_failures >= self.config.failure_threshold {
                        self.open(now);
                    }
                }
            }
            // Late outcome of a call admitted before the circuit tripped.
            _ => {
                if success {
                    self.consecutive_failures = 0;
                } else {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                }
            }
        }
    }

    /// Forget an attempt that never settled.
    pub fn release(&mut self, attempt: Attempt) {
        if attempt == Attempt::Trial && self.state == CircuitState::HalfOpen {
            self.trial_in_flight = false;
        }
    }

    fn open(&mut self, now: Millis) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN_MS: u64 = 60_000;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig::default())
    }

    fn fail(cb: &mut CircuitBreaker, times: u32, now: Millis) {
        for _ in 0..times {
            let attempt = cb.try_acquire(now).expect("closed breaker admits");
            cb.record(attempt, false, now);
        }
    }

    #[test]
    fn test_opens_at_threshold() {
        let mut cb = breaker();

        fail(&mut cb, 4, 0);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 4);

        fail(&mut cb, 1, 100);
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.opened_at(), Some(100));
        assert_eq!(cb.try_acquire(200), None);
        assert_eq!(cb.consecutive_failures(), 5, "rejections are not failures");
    }

    #[test]
    fn test_success_resets_failures() {
        let mut cb = breaker();

        fail(&mut cb, 4, 0);
        let attempt = cb.try_acquire(0).unwrap();
        cb.record(attempt, true, 0);
        assert_eq!(cb.consecutive_failures(), 0);

        fail(&mut cb, 4, 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_cooldown_must_strictly_elapse() {
        let mut cb = breaker();
        fail(&mut cb, 5, 1_000);

        assert_eq!(cb.try_acquire(1_000 + COOLDOWN_MS), None);
        assert_eq!(cb.try_acquire(1_001 + COOLDOWN_MS), Some(Attempt::Trial));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_single_trial_then_close() {
        let mut cb = breaker();
        fail(&mut cb, 5, 0);

        let now = COOLDOWN_MS + 1;
        let trial = cb.try_acquire(now).unwrap();
        assert_eq!(cb.try_acquire(now), None, "only one trial at a time");

        cb.record(trial, true, now);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert_eq!(cb.opened_at(), None);
        assert_eq!(cb.try_acquire(now), Some(Attempt::Normal));
    }

    #[test]
    fn test_failed_trial_reopens_with_fresh_timestamp() {
        let mut cb = breaker();
        fail(&mut cb, 5, 0);

        let now = COOLDOWN_MS + 5;
        let trial = cb.try_acquire(now).unwrap();
        cb.record(trial, false, now);

        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.opened_at(), Some(now));
        assert_eq!(cb.try_acquire(now + COOLDOWN_MS), None);
        assert!(cb.try_acquire(now + COOLDOWN_MS + 1).is_some());
    }

    #[test]
    fn test_released_trial_allows_another_probe() {
        let mut cb = breaker();
        fail(&mut cb, 5, 0);

        let now = COOLDOWN_MS + 1;
        let trial = cb.try_acquire(now).unwrap();
        cb.release(trial);

        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.try_acquire(now), Some(Attempt::Trial));
    }

    #[test]
    fn test_late_outcomes_do_not_move_state() {
        let mut cb = breaker();
        let stragglers: Vec<_> = (0..2).map(|_| cb.try_acquire(0).unwrap()).collect();
        fail(&mut cb, 5, 0);

        cb.record(stragglers[0], false, 10);
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.opened_at(), Some(0));
        assert_eq!(cb.consecutive_failures(), 6);

        cb.record(stragglers[1], true, 20);
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[test]
    fn test_set_config_preserves_state() {
        let mut cb = breaker();
        fail(&mut cb, 3, 0);

        cb.set_config(CircuitBreakerConfig {
            failure_threshold: 4,
            cooldown_secs: 1,
        });
        assert_eq!(cb.consecutive_failures(), 3);

        fail(&mut cb, 1, 0);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.try_acquire(1_001).is_some());
    }
}
