//! Quarry Connectors - uniform retrieval of tabular data
//!
//! This crate is the execution framework shared by every concrete connector:
//! - configuration and identity modeling ([`config`], [`Secret`])
//! - deterministic cache-key derivation ([`cache_key`])
//! - the retry controller around data retrieval ([`retry`])
//! - the slicing and permission-filtering pipeline (via `quarry-core`)
//!
//! A concrete connector implements [`Connector`] with a single retrieval
//! operation and gets `get_df`, `get_slice`, `get_cache_key`, `get_status`
//! and `explain` for free.

pub mod cache_key;
pub mod config;
pub mod discovery;
pub mod error;
pub mod retry;
pub mod status;
pub mod token_cache;

pub use cache_key::{derive_cache_key, CacheKey, CacheKeyError};
pub use config::{connector_from_config, data_source_from_config, ConfigError, Secret};
pub use discovery::{ColumnInfo, Discoverable, TableInfo};
pub use error::ConnectorError;
pub use retry::{resolve_policy, run_with_retry, Backoff, RetryPolicy, RetryStrategy};
pub use status::ConnectorStatus;
pub use token_cache::{AccessToken, TokenCache};

// The tabular model callers interact with.
pub use quarry_core::{
    slice_frame, ColumnLabel, Condition, DataFrame, DataSlice, DataStats, Operator,
    SlicePagination,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One query against a connector.
///
/// Many data source instances reference one connector; the caller supplies
/// both together. Vendor-specific query fields (query string, table name,
/// parameters...) are plain struct fields on the implementing type.
pub trait DataSource: Serialize + DeserializeOwned + Send + Sync {
    /// The domain this query belongs to.
    fn domain(&self) -> &str;

    /// Name of the query, unique within its domain.
    fn name(&self) -> &str;
}

/// A concrete data source connector.
///
/// The implementing type doubles as the connector's validated configuration:
/// its fields are the vendor-specific settings (hosts, credentials...), it
/// is constructed from a mapping through
/// [`connector_from_config`](config::connector_from_config), and its serde
/// serialization is its cache identity. Wrap credential fields in
/// [`Secret`] so they are redacted from that identity, and mark fields that
/// should not participate in identity at all with
/// `#[serde(skip_serializing)]`.
///
/// Only [`Connector::retrieve_data`] is required; everything else has a
/// framework default.
#[async_trait]
pub trait Connector: Serialize + Send + Sync {
    /// The query model bound to this connector type. Exactly one per
    /// connector; a type without one cannot implement the trait.
    type DataSource: DataSource;

    /// Type tag identifying the connector kind in configuration mappings.
    const TYPE: &'static str;

    /// Name of this connector instance, unique within a deployment.
    fn name(&self) -> &str;

    /// Fetch the raw tabular result for one data source. May perform any
    /// I/O it needs, but presents a synchronous success-or-failure boundary
    /// to the framework: the retry controller only observes the whole call.
    async fn retrieve_data(
        &self,
        data_source: &Self::DataSource,
    ) -> Result<DataFrame, ConnectorError>;

    /// Retry behavior for this connector. Defaults to the framework policy;
    /// return [`RetryStrategy::Disabled`] to never retry.
    fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::Default
    }

    /// Whether a retrieval failure may be re-attempted. Defaults to
    /// retrying every failure kind; anything reported non-retriable
    /// propagates immediately regardless of the attempt budget.
    fn is_retriable(&self, _error: &ConnectorError) -> bool {
        true
    }

    /// Lightweight health probe. The default reports an unchecked status
    /// and never fails.
    async fn get_status(&self) -> ConnectorStatus {
        ConnectorStatus::default()
    }

    /// Diagnostic description of how a query would run (a query plan, an
    /// expanded request...), without materializing data. Defaults to `None`.
    async fn explain(
        &self,
        _data_source: &Self::DataSource,
    ) -> Result<Option<String>, ConnectorError> {
        Ok(None)
    }

    /// Retrieve the full result for `data_source`: retry-wrapped retrieval,
    /// then permission filtering and column normalization, no slicing.
    async fn get_df(
        &self,
        data_source: &Self::DataSource,
        permissions: Option<&Condition>,
    ) -> Result<DataFrame, ConnectorError> {
        Ok(self.get_slice(data_source, permissions, 0, None).await?.df)
    }

    /// Retrieve a bounded window of the result, with the statistics
    /// paginated callers need.
    async fn get_slice(
        &self,
        data_source: &Self::DataSource,
        permissions: Option<&Condition>,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<DataSlice, ConnectorError> {
        self.get_slice_with_policy(data_source, permissions, offset, limit, None)
            .await
    }

    /// Like [`Connector::get_slice`] with an explicit per-call retry policy
    /// override, taking precedence over the connector's strategy.
    async fn get_slice_with_policy(
        &self,
        data_source: &Self::DataSource,
        permissions: Option<&Condition>,
        offset: usize,
        limit: Option<usize>,
        policy: Option<RetryPolicy>,
    ) -> Result<DataSlice, ConnectorError> {
        let resolved = retry::resolve_policy(policy, self.retry_strategy());
        let raw = retry::run_with_retry(
            resolved.as_ref(),
            |error| self.is_retriable(error),
            || self.retrieve_data(data_source),
        )
        .await?;
        Ok(slice_frame(raw, permissions, offset, limit)?)
    }

    /// Deterministic fingerprint of {connector identity, data source,
    /// permissions}, for callers memoizing retrieval results. Secrets never
    /// influence the key. Pure: no I/O, no clock.
    fn get_cache_key(
        &self,
        data_source: Option<&Self::DataSource>,
        permissions: Option<&Condition>,
    ) -> Result<CacheKey, CacheKeyError> {
        derive_cache_key(Self::TYPE, self, data_source, permissions)
    }
}
