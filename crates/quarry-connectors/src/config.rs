//! Connector and data source construction from configuration mappings.
//!
//! A connector type is its own validated configuration: vendor-specific
//! settings are plain struct fields deserialized with serde. The helpers
//! here add the checks serde cannot express (type-tag agreement, non-empty
//! identity fields) and the [`Secret`] wrapper for credential fields.

use crate::{Connector, DataSource};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Marker every serialized secret collapses to.
const REDACTED: &str = "**********";

/// Errors raised while building a connector or data source from a mapping.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration must be a mapping")]
    NotAMapping,

    #[error("connector type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("connector name cannot be empty")]
    EmptyName,

    #[error("data source domain cannot be empty")]
    EmptyDomain,

    #[error("data source name cannot be empty")]
    EmptyDataSourceName,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A field that participates in retrieval but never in serialized output.
///
/// Serialization yields a constant redaction marker, so a secret can neither
/// leak into a cache key nor make two otherwise-identical connectors derive
/// different keys. `Debug` is redacted as well; call [`Secret::expose`] to
/// read the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Secret(value)
    }

    /// Access the underlying value for use in a retrieval call.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Secret(value)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(")?;
        f.write_str(REDACTED)?;
        f.write_str(")")
    }
}

impl<T> Serialize for Secret<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret)
    }
}

/// Build a connector instance from a configuration mapping.
///
/// When the mapping carries a `type` tag it must match the connector's
/// declared [`Connector::TYPE`]; the instance `name` must be non-empty.
pub fn connector_from_config<C>(config: Value) -> Result<C, ConfigError>
where
    C: Connector + DeserializeOwned,
{
    let map = config.as_object().ok_or(ConfigError::NotAMapping)?;
    if let Some(tag) = map.get("type").and_then(Value::as_str) {
        if tag != C::TYPE {
            return Err(ConfigError::TypeMismatch {
                expected: C::TYPE.to_string(),
                found: tag.to_string(),
            });
        }
    }

    let connector: C =
        serde_json::from_value(config).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    if connector.name().trim().is_empty() {
        return Err(ConfigError::EmptyName);
    }
    Ok(connector)
}

/// Build a data source instance from a configuration mapping, checking the
/// identity fields shared by every query model.
pub fn data_source_from_config<D>(config: Value) -> Result<D, ConfigError>
where
    D: DataSource,
{
    if !config.is_object() {
        return Err(ConfigError::NotAMapping);
    }
    let data_source: D =
        serde_json::from_value(config).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    if data_source.domain().trim().is_empty() {
        return Err(ConfigError::EmptyDomain);
    }
    if data_source.name().trim().is_empty() {
        return Err(ConfigError::EmptyDataSourceName);
    }
    Ok(data_source)
}
