//! Per-service circuit breaker table.
//!
//! Every backend call is bracketed by [`CircuitBreakers::may_attempt`] and
//! [`AttemptPermit::record`]. The permit is an RAII guard: dropping it
//! without recording (the caller abandoned the request) settles nothing,
//! but frees a half-open trial slot so a later call can probe again.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::{Clock, Millis};
use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{Attempt, CircuitBreaker, CircuitState};

/// Read-only view of one breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub opened_at: Option<Millis>,
}

#[derive(Debug)]
pub struct CircuitBreakers {
    breakers: DashMap<String, CircuitBreaker>,
    defaults: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
}

impl CircuitBreakers {
    pub fn new(defaults: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            breakers: DashMap::new(),
            defaults,
            clock,
        }
    }

    /// Create a closed breaker for `service`, or keep the existing one.
    ///
    /// An existing breaker keeps its state; only its thresholds change when
    /// an override is given.
    pub fn ensure(&self, service: &str, config: Option<CircuitBreakerConfig>) {
        let config = config.unwrap_or(self.defaults);
        self.breakers
            .entry(service.to_owned())
            .and_modify(|cb| cb.set_config(config))
            .or_insert_with(|| CircuitBreaker::new(config));
    }

    /// Ask to call `service`. `None` means the circuit is open.
    pub fn may_attempt(&self, service: &str) -> Option<AttemptPermit<'_>> {
        let now = self.clock.now();
        let mut breaker = self
            .breakers
            .entry(service.to_owned())
            .or_insert_with(|| CircuitBreaker::new(self.defaults));

        let before = breaker.state();
        let attempt = breaker.try_acquire(now);
        let after = breaker.state();
        drop(breaker);

        if before != after {
            tracing::info!(service = %service, from = %before, to = %after, "Circuit breaker transition");
            metrics::record_circuit_transition(service, after);
        }

        attempt.map(|attempt| AttemptPermit {
            breakers: self,
            service: service.to_owned(),
            attempt,
            settled: false,
        })
    }

    pub fn state_of(&self, service: &str) -> Option<BreakerStatus> {
        self.breakers
            .get(service)
            .map(|cb| status(service, cb.value()))
    }

    /// Snapshot of every breaker, sorted by service name. Never transitions.
    pub fn snapshot(&self) -> Vec<BreakerStatus> {
        let mut out: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| status(entry.key(), entry.value()))
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn settle(&self, service: &str, attempt: Attempt, success: bool) -> Option<CircuitState> {
        let now = self.clock.now();
        let mut breaker = self.breakers.get_mut(service)?;

        let before = breaker.state();
        breaker.record(attempt, success, now);
        let after = breaker.state();
        let failures = breaker.consecutive_failures();
        drop(breaker);

        if before == after {
            return None;
        }
        match after {
            CircuitState::Open => tracing::warn!(
                service = %service,
                consecutive_failures = failures,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(service = %service, from = %before, to = %after, "Circuit breaker transition"),
        }
        metrics::record_circuit_transition(service, after);
        Some(after)
    }

    fn release(&self, service: &str, attempt: Attempt) {
        if let Some(mut breaker) = self.breakers.get_mut(service) {
            breaker.release(attempt);
        }
    }
}

fn status(name: &str, cb: &CircuitBreaker) -> BreakerStatus {
    BreakerStatus {
        name: name.to_owned(),
        state: cb.state(),
        consecutive_failures: cb.consecutive_failures(),
        opened_at: cb.opened_at(),
    }
}

/// Permission to make one backend call.
#[derive(Debug)]
pub struct AttemptPermit<'a> {
    breakers: &'a CircuitBreakers,
    service: String,
    attempt: Attempt,
    settled: bool,
}

impl AttemptPermit<'_> {
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// Settle the call. Returns the new state if the breaker transitioned.
    pub fn record(mut self, success: bool) -> Option<CircuitState> {
        self.settled = true;
        self.breakers.settle(&self.service, self.attempt, success)
    }
}

impl Drop for AttemptPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breakers.release(&self.service, self.attempt);
        }
    }
}
