//! Backend service record.

use serde::Serialize;
use url::Url;

use crate::clock::Millis;

/// A registered backend service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEntry {
    /// Unique key.
    pub name: String,
    /// Prefix every forwarded path is joined onto.
    pub base_address: Url,
    /// Result of the latest health observation.
    pub healthy: bool,
    /// When `healthy` was last written.
    pub last_checked_at: Millis,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, base_address: Url, now: Millis) -> Self {
        Self {
            name: name.into(),
            base_address,
            healthy: true,
            last_checked_at: now,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            name: self.name.clone(),
            base_address: self.base_address.to_string(),
            healthy: self.healthy,
            last_checked_at: self.last_checked_at,
        }
    }
}

/// Read-only view of a service, as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub base_address: String,
    pub healthy: bool,
    pub last_checked_at: Millis,
}
