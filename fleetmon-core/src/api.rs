//! The status API seam
//!
//! `FleetApi` is the pluggable backend the dashboard talks to. The binary
//! ships an HTTP implementation; tests drive the core with scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ControlAction, InstanceSnapshot};

/// Transport-level failures. Application failures (`success: false`) are
/// not errors here; they arrive as ordinary response bodies.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP error! Status: {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
}

/// `GET /status`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub instances: Option<Vec<InstanceSnapshot>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// `GET /logs/{id}`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LogResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A single metric datapoint
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MetricSample {
    pub timestamp: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl MetricSample {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            unit: None,
        }
    }
}

/// `GET /metrics/{id}`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub cpu_utilization: Option<Vec<MetricSample>>,
    #[serde(default)]
    pub network_in: Option<Vec<MetricSample>>,
    #[serde(default)]
    pub network_out: Option<Vec<MetricSample>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// `POST /control/{id}/{action}`; any other fields are ignored
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn status(&self) -> Result<StatusResponse, ApiError>;

    async fn logs(&self, instance_id: &str) -> Result<LogResponse, ApiError>;

    async fn metrics(&self, instance_id: &str) -> Result<MetricsResponse, ApiError>;

    async fn control(
        &self,
        instance_id: &str,
        action: ControlAction,
    ) -> Result<ControlResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_without_instances() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"success": false, "error_message": "rate limited"}"#)
                .unwrap();
        assert!(!resp.success);
        assert!(resp.instances.is_none());
        assert_eq!(resp.error_message.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_control_response_ignores_extra_fields() {
        let resp: ControlResponse = serde_json::from_str(
            r#"{"success": true, "message": "start request sent.", "action": "start"}"#,
        )
        .unwrap();
        assert_eq!(resp.message.as_deref(), Some("start request sent."));

        let empty: ControlResponse = serde_json::from_str(r#"{"detail": "boom"}"#).unwrap();
        assert!(empty.message.is_none());
    }

    #[test]
    fn test_metrics_sample_with_unit() {
        let resp: MetricsResponse = serde_json::from_str(
            r#"{"success": true, "cpu_utilization": [{"timestamp": "10:05", "value": 3.5, "unit": "%"}]}"#,
        )
        .unwrap();
        let cpu = resp.cpu_utilization.unwrap();
        assert_eq!(cpu[0].unit.as_deref(), Some("%"));
        assert!(resp.network_in.is_none());
    }
}
