//! Request gateway library: admission control, circuit breaking, service
//! registry and health checking in front of HTTP backends.

// Core
pub mod clock;
pub mod config;
pub mod gateway;
pub mod registry;
pub mod upstream;

// Traffic management
pub mod health;
pub mod ratelimit;
pub mod resilience;

// Surfaces
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayError, Identity, RequestOptions, ServiceOptions};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
