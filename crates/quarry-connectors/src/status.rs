//! Connector health reporting.

use serde::{Deserialize, Serialize};

/// Result of a connector health probe.
///
/// `status: None` means unknown/unchecked, which is also the default a
/// connector reports when it does not implement a probe. `details` lists
/// individual checks (hostname reachable, port open, authenticated, ...)
/// with `None` marking checks that were not reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    pub status: Option<bool>,
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<(String, Option<bool>)>,
    pub error: Option<String>,
}

impl ConnectorStatus {
    /// A healthy status with a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Some(true),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A failed status carrying the underlying error text.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(false),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_details(mut self, details: Vec<(String, Option<bool>)>) -> Self {
        self.details = details;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unchecked() {
        let status = ConnectorStatus::default();
        assert_eq!(status.status, None);
        assert_eq!(status.error, None);
        assert!(status.details.is_empty());
    }

    #[test]
    fn test_ok_and_failed_constructors() {
        let ok = ConnectorStatus::ok("Connector status OK");
        assert_eq!(ok.status, Some(true));
        assert_eq!(ok.message.as_deref(), Some("Connector status OK"));

        let failed = ConnectorStatus::failed("Credentials are missing")
            .with_details(vec![("Authenticated".to_string(), Some(false))]);
        assert_eq!(failed.status, Some(false));
        assert_eq!(failed.error.as_deref(), Some("Credentials are missing"));
        assert_eq!(failed.details.len(), 1);
    }
}
