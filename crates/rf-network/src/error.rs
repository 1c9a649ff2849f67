//! Network-subsystem error type.

use thiserror::Error;

use rf_core::{CoreError, EdgeIdx};

/// Errors produced by `rf-network`.
///
/// Bad data *inside* a well-formed collection (unsupported geometry, missing
/// attributes) is not an error: it is logged and degraded to defaults.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("{0} not found in graph")]
    EdgeNotFound(EdgeIdx),

    #[error("no edge with id {0}")]
    UnknownEdgeId(i64),

    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
