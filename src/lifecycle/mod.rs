//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build gateway → Start background tasks → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Listeners drain, background tasks exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Config reload arrives through the file watcher, not SIGHUP

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
