//! Service registry.
//!
//! # Responsibilities
//! - Hold the known backend services and their base addresses
//! - Track each service's health flag and when it was last written
//!
//! # Design Decisions
//! - Services are never removed while running
//! - Re-registering a name only replaces its address
//! - Health updates for unknown names are ignored, so a health check
//!   racing a configuration change cannot fail

pub mod service;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use url::Url;

use crate::clock::Clock;

pub use service::{ServiceEntry, ServiceStatus};

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    /// The name was known; its address was replaced.
    Updated,
}

#[derive(Debug)]
pub struct ServiceRegistry {
    services: DashMap<String, ServiceEntry>,
    clock: Arc<dyn Clock>,
}

impl ServiceRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            services: DashMap::new(),
            clock,
        }
    }

    pub fn register(&self, name: &str, base_address: Url) -> Registration {
        match self.services.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().base_address = base_address;
                Registration::Updated
            }
            Entry::Vacant(entry) => {
                entry.insert(ServiceEntry::new(name, base_address, self.clock.now()));
                Registration::Created
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<ServiceEntry> {
        self.services.get(name).map(|entry| entry.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Record a health observation. Returns the previous flag, or `None`
    /// when the service is unknown (nothing is written).
    pub fn set_health(&self, name: &str, healthy: bool) -> Option<bool> {
        let now = self.clock.now();
        let mut entry = self.services.get_mut(name)?;
        let previous = entry.healthy;
        entry.healthy = healthy;
        entry.last_checked_at = now;
        Some(previous)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Status of every service, sorted by name.
    pub fn snapshot(&self) -> Vec<ServiceStatus> {
        let mut out: Vec<_> = self.services.iter().map(|e| e.value().status()).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
