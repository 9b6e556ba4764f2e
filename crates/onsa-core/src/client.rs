//! HTTP client for an A2A server.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::dispatcher::DispatchOutcome;
use crate::protocol::TaskRequest;
use crate::wire::{
    AgentInfo, CapabilitiesResponse, DiscoveryFilter, DiscoveryResponse, ErrorBody, HealthReport,
    MetricsReport,
};

/// Client-side failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server returned {status}: {detail}")]
    Status {
        /// HTTP status
        status: StatusCode,
        /// `detail` from the error body, or the raw body
        detail: String,
    },

    /// Body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

/// Client for one A2A server.
#[derive(Debug, Clone)]
pub struct A2aClient {
    base_url: String,
    http: Client,
}

impl A2aClient {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Client with a default HTTP configuration.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Self::DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(base_url, http))
    }

    /// Client sharing an existing `reqwest::Client`.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// Server base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        self.send(self.http.get(self.url("/health"))).await
    }

    /// Whether `GET /health` answers with a 2xx status. The body is not read.
    pub async fn is_healthy(&self) -> Result<bool, ClientError> {
        let response = self.http.get(self.url("/health")).send().await?;
        Ok(response.status().is_success())
    }

    /// `GET /metrics`
    pub async fn metrics(&self) -> Result<MetricsReport, ClientError> {
        self.send(self.http.get(self.url("/metrics"))).await
    }

    /// `POST /a2a/discovery`
    pub async fn discover(
        &self,
        filter: &DiscoveryFilter,
    ) -> Result<DiscoveryResponse, ClientError> {
        self.send(self.http.post(self.url("/a2a/discovery")).json(filter))
            .await
    }

    /// `GET /a2a/agents/{agent_id}`
    pub async fn agent_info(&self, agent_id: &str) -> Result<AgentInfo, ClientError> {
        self.send(self.http.get(self.url(&format!("/a2a/agents/{}", agent_id))))
            .await
    }

    /// `GET /a2a/capabilities`
    pub async fn capabilities(&self) -> Result<CapabilitiesResponse, ClientError> {
        self.send(self.http.get(self.url("/a2a/capabilities"))).await
    }

    /// `POST /a2a/task`: any healthy agent with the capability.
    pub async fn execute_task(
        &self,
        request: &TaskRequest,
    ) -> Result<DispatchOutcome, ClientError> {
        self.send(self.http.post(self.url("/a2a/task")).json(request))
            .await
    }

    /// `POST /a2a/agents/{agent_id}/task`
    pub async fn execute_on(
        &self,
        agent_id: &str,
        request: &TaskRequest,
    ) -> Result<DispatchOutcome, ClientError> {
        let url = self.url(&format!("/a2a/agents/{}/task", agent_id));
        self.send(self.http.post(url).json(request)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, url = %response.url(), "A2A response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or(body);
            return Err(ClientError::Status { status, detail });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
