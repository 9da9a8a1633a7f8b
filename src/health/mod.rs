//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Gateway::check_all (GET <health path> as the health-probe identity)
//!     → Registry health flag + last_checked_at
//!
//! Passive health (gateway engine):
//!     Breaker opens  → service marked unhealthy
//!     Breaker closes → service marked healthy
//! ```
//!
//! # Design Decisions
//! - Health is advisory; routing never consults the flag
//! - Probes travel through the breaker, so an open circuit reads unhealthy
//! - Probes are exempt from rate limiting

pub mod active;

pub use active::HealthMonitor;
