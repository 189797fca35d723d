use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{ApiResponse, HealthStatus, QueryRequest};

/// HTTP client for the chatbot backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    endpoint: Url,
}

impl ApiClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, None)
    }

    /// Build a client whose requests fail after `timeout`. `None` waits
    /// indefinitely.
    pub fn with_timeout(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Submit `text` and decode the tagged reply.
    pub async fn query(&self, text: &str) -> Result<ApiResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&QueryRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        let decoded = ApiResponse::from_value(value);
        debug!(tag = decoded.tag(), "decoded backend response");

        Ok(decoded)
    }

    /// Probe the backend's root route.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.health_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    fn health_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

/// Validate an endpoint string. Only http and https are accepted.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint.trim()).map_err(|e| Error::Url(format!("{endpoint}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Url(format!("{endpoint}: unsupported scheme '{other}'"))),
    }
}
