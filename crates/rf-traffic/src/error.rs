//! Traffic-subsystem error type.

use thiserror::Error;

use rf_network::NetworkError;

/// Errors produced by `rf-traffic`.
///
/// Only invalid arguments surface here.  Closed lanes, unreachable targets,
/// and traversal limits degrade to zero flow, empty routes, or truncated
/// results instead.
#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("input flow must be finite and non-negative, got {0}")]
    InvalidFlow(f64),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub type TrafficResult<T> = Result<T, TrafficError>;
