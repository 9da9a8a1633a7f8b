//! Status snapshot served to dashboards.

use serde::Serialize;

use crate::registry::ServiceStatus;
use crate::resilience::BreakerStatus;

/// Point-in-time view of every service and breaker, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayStatus {
    pub services: Vec<ServiceStatus>,
    pub circuit_breakers: Vec<BreakerStatus>,
}
