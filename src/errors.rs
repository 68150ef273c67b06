//! Error types for the engine pool and the inflater

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The handle passed to `return_engine` was not issued by this pool
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Shared pool has already been initialized")]
    AlreadyInitialized,

    #[error("Operation was cancelled")]
    Cancelled,

    #[cfg(feature = "metrics")]
    #[error("Failed to export metrics: {0}")]
    MetricsExport(String),
}

pub type PoolResult<T> = Result<T, PoolError>;

/// Errors raised while inflating a compressed stream
#[derive(Error, Debug)]
pub enum InflateError {
    #[error("Corrupt deflate stream: {0}")]
    Corrupt(#[from] flate2::DecompressError),

    #[error("Stream already finished - reset the engine before decoding another")]
    Finished,

    #[error("Compressed stream ended before its final block")]
    Truncated,
}

pub type InflateResult<T> = Result<T, InflateError>;
