//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Turn an elapsed deadline into a transport failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout errors are distinct from other errors
//! - Timed-out requests surface as 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::upstream::TransportError;

/// Run `call`, failing with [`TransportError::Timeout`] after `limit`.
pub async fn bounded<F, T>(limit: Duration, call: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}
