use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use fleetmon_core::api::{
    ApiError, ControlResponse, FleetApi, LogResponse, MetricsResponse, StatusResponse,
};
use fleetmon_core::model::ControlAction;

/// `FleetApi` over the dashboard's JSON HTTP endpoints
pub struct HttpFleetApi {
    client: Client,
    base_url: String,
}

impl HttpFleetApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and decode; anything but a 2xx JSON body is a transport failure
    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FleetApi for HttpFleetApi {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.fetch(self.client.get(self.url("/status"))).await
    }

    async fn logs(&self, instance_id: &str) -> Result<LogResponse, ApiError> {
        debug!(instance = instance_id, "fetching console log");
        self.fetch(self.client.get(self.url(&format!("/logs/{}", instance_id))))
            .await
    }

    async fn metrics(&self, instance_id: &str) -> Result<MetricsResponse, ApiError> {
        debug!(instance = instance_id, "fetching metrics");
        self.fetch(self.client.get(self.url(&format!("/metrics/{}", instance_id))))
            .await
    }

    /// Only an unreachable server is an error here. Any answer, whatever its
    /// status or shape, is reduced to an optional message.
    async fn control(
        &self,
        instance_id: &str,
        action: ControlAction,
    ) -> Result<ControlResponse, ApiError> {
        let url = self.url(&format!("/control/{}/{}", instance_id, action));
        let resp = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(instance = instance_id, %status, "control endpoint returned an error status");
        }

        let body = resp.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Server;
    use serde_json::json;

    use super::*;

    fn api_for(server: &Server) -> HttpFleetApi {
        HttpFleetApi::new(&format!("{}/api/", server.url()), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_status_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "instances": [{
                        "InstanceId": "i-0abc",
                        "Name": "web-1",
                        "PublicIp": "3.4.5.6",
                        "PrivateIp": "10.0.0.4",
                        "InstanceType": "t3.micro",
                        "InstanceState": "running",
                        "SystemStatus": "ok",
                        "InstanceStatus": "ok",
                        "LastUpdated": "2024-05-01 10:00:00 UTC"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resp = api_for(&server).status().await.unwrap();
        assert!(resp.success);
        let instances = resp.instances.unwrap();
        assert_eq!(instances[0].name, "web-1");
        assert_eq!(instances[0].display_address(), "3.4.5.6");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_server_error_is_transport_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/status")
            .with_status(502)
            .create_async()
            .await;

        let err = api_for(&server).status().await.unwrap_err();
        assert_eq!(err, ApiError::Status(502));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/logs/i-1")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = api_for(&server).logs("i-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_metrics_request_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/metrics/i-1")
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "instance_id": "i-1",
                    "cpu_utilization": [{"timestamp": "10:00", "value": 4.2, "unit": "%"}],
                    "network_in": [],
                    "network_out": []
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resp = api_for(&server).metrics("i-1").await.unwrap();
        assert_eq!(resp.cpu_utilization.unwrap()[0].value, 4.2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_control_tolerates_error_responses() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("POST", "/api/control/i-1/start")
            .with_status(200)
            .with_body(json!({"success": true, "message": "start request sent."}).to_string())
            .create_async()
            .await;
        let failing = server
            .mock("POST", "/api/control/i-1/stop")
            .with_status(500)
            .with_body(json!({"detail": "permission denied"}).to_string())
            .create_async()
            .await;

        let api = api_for(&server);
        let started = api.control("i-1", ControlAction::Start).await.unwrap();
        assert_eq!(started.message.as_deref(), Some("start request sent."));

        let stopped = api.control("i-1", ControlAction::Stop).await.unwrap();
        assert!(stopped.message.is_none());

        ok.assert_async().await;
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let api = HttpFleetApi::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = api.status().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
