//! HTTP implementation of the light service.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use tracing::trace;

use super::traits::{LightsService, ServiceError};
use super::types::{Command, CommandReply, ErrorResponse, HealthReport, Method, StatusSnapshot};

/// Light service reached over HTTP.
///
/// The client carries no deadline of its own; callers wrap each call in one.
pub struct HttpLightsService {
    client: Client,
    base_url: String,
}

impl HttpLightsService {
    /// Create a service client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ServiceError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .map(|e| e.error);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LightsService for HttpLightsService {
    async fn ping(&self) -> Result<(), ServiceError> {
        let response = self.client.get(self.url("/")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message: None,
            });
        }
        Ok(())
    }

    async fn health(&self) -> Result<HealthReport, ServiceError> {
        let response = self.client.get(self.url("/health")).send().await?;
        Self::handle_response(response).await
    }

    async fn status(&self) -> Result<StatusSnapshot, ServiceError> {
        let response = self.client.get(self.url("/status")).send().await?;
        Self::handle_response(response).await
    }

    async fn send(&self, command: &Command) -> Result<CommandReply, ServiceError> {
        let url = self.url(&command.path());
        trace!(%url, method = ?command.method(), "Sending command");

        let request = match command.method() {
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
        };

        let response = request.json(&command.body()).send().await?;
        Self::handle_response(response).await
    }
}
