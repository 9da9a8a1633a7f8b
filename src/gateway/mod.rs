//! Gateway engine.
//!
//! # Data Flow
//! ```text
//! route(service, path, identity, options)
//!     → registry lookup        (ServiceNotFound)
//!     → breaker may_attempt    (CircuitOpen)
//!     → rate limiter           (RateLimited; health probes exempt)
//!     → transport send + deadline
//!     → breaker record         (UpstreamUnavailable on transport failure)
//! ```
//!
//! # Design Decisions
//! - One engine value owns every piece of shared state; handlers hold it in an Arc
//! - Identity is typed; anonymous callers and probes never share a client's quota

pub mod engine;
pub mod error;
pub mod identity;
pub mod options;
pub mod status;

pub use engine::{Gateway, RouteOutcome, RouteResponse};
pub use error::{GatewayError, RegistrationError};
pub use identity::Identity;
pub use options::{RequestOptions, ServiceOptions};
pub use status::GatewayStatus;
