//! Retry Module
//!
//! Bounded retries with exponential backoff for calls to the hosted backend.
//! Failures are mapped to an [`ErrorKind`] by the caller; only transient ones
//! are retried and the original error is always handed back unchanged.

mod classify;
mod policy;

pub use classify::{classify_message, Classify, ErrorKind};
pub use policy::{with_retry, with_retry_classified, RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER};
