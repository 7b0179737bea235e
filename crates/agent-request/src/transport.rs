//! HTTP delivery of readings.

use crate::{RequestError, RequestResult};
use agent_readings::Reading;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Request transport configuration.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Collection service base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// One-shot request/response transport.
pub struct RequestTransport {
    client: Client,
    base_url: String,
}

impl RequestTransport {
    /// Create a new request transport.
    pub fn new(config: RequestConfig) -> RequestResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST one reading to the readings endpoint.
    ///
    /// Success is strictly status 201; the parsed response body is
    /// returned as the acknowledgment. Any other status yields
    /// [`RequestError::Rejected`] with the body text preserved verbatim.
    pub async fn post_reading(&self, reading: &Reading) -> RequestResult<Value> {
        let url = format!("{}/api/device/readings", self.base_url);
        debug!(url = %url, serial_number = %reading.serial_number, "posting reading");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(reading)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 201 {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Rejected { status, body });
        }

        let body = response.text().await?;
        let ack = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body)?
        };
        Ok(ack)
    }
}
