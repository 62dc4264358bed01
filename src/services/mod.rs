pub mod address;
pub mod cache;
pub mod classifier;
pub mod diagnostics;
pub mod identity;
pub mod media;
pub mod parts;
pub mod resolver;
pub mod scanner;

use crate::store::StoreError;
use tracing::debug;

/// Tunables for resolution and scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// `msg_box` value that marks a received message.
    pub inbound_box: i64,
    /// Digits kept for tail matching.
    pub tail_digits: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            inbound_box: 1,
            tail_digits: address::DEFAULT_TAIL_DIGITS,
        }
    }
}

/// Turns a failed store call into "this tier produced nothing".
pub(crate) fn degrade<T>(tier: &str, result: Result<T, StoreError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(target: "store", tier, error = %e, "Tier failed, falling through");
            None
        }
    }
}
