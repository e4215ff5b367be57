//! Typed errors for the connector framework.

use crate::cache_key::CacheKeyError;
use crate::config::ConfigError;
use quarry_core::{ConditionError, FrameError};
use thiserror::Error;

/// Errors surfaced by connector execution.
///
/// Retrieval failures (`ConnectionFailed`, `QueryFailed`,
/// `AuthenticationFailed`, `Retrieval`) come out of a connector's
/// `retrieve_data` and go through the retry controller; the remaining
/// variants are raised by the framework itself and are never retried.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Failed to reach the external source.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The source rejected or failed the query.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Credentials were rejected or could not be refreshed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Any other connector-specific retrieval failure.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// Invalid connector or data source configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed or unsupported permission filter.
    #[error(transparent)]
    Filter(#[from] ConditionError),

    /// The connector produced a malformed tabular result.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Cache key derivation failed.
    #[error(transparent)]
    CacheKey(#[from] CacheKeyError),
}
