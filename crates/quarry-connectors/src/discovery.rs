//! Optional table-discovery capability for connectors that can enumerate
//! the datasets they expose.

use crate::error::ConnectorError;
use crate::Connector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A column of a discoverable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// A table (or collection, sheet, endpoint...) a connector exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    pub columns: Vec<ColumnInfo>,
}

/// Connectors able to list the tables they can retrieve from.
#[async_trait]
pub trait Discoverable: Connector {
    async fn get_model(&self) -> Result<Vec<TableInfo>, ConnectorError>;
}
