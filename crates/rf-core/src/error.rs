//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `From`.

use thiserror::Error;

/// The error type for `rf-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `rf-core`.
pub type CoreResult<T> = Result<T, CoreError>;
