//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → startup builds the Gateway from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → service list re-applied to the running Gateway
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Reload only touches services; limiter and breaker settings need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CircuitBreakerConfig, ForwardingConfig, GatewayConfig, HealthCheckConfig,
    LimitsConfig, ListenerConfig, ObservabilityConfig, RateLimitConfig, RateLimitStrategy,
    ServiceConfig, TimeoutConfig,
};
