//! Shared HTTP transport for the step clients.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::StepError;

/// Base URLs of the downstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub inventory: String,
    pub fraud: String,
    pub payment: String,
    pub shipping: String,
    pub notification: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            inventory: "http://nodejs-service:3000".to_string(),
            fraud: "http://fraud-service:5000".to_string(),
            payment: "http://payment-service:8082".to_string(),
            shipping: "http://shipping-service:5000".to_string(),
            notification: "http://java-service:8081".to_string(),
        }
    }
}

/// JSON-over-HTTP transport owned by the step clients.
///
/// Deadlines are enforced by the orchestrator around each call, so the
/// transport itself does not impose one.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POSTs `body` as JSON to `url` and decodes a JSON response.
    ///
    /// Every failure is mapped into a [`StepError`]: connect and I/O errors
    /// become `Network`, non-2xx answers become `Status`, and undecodable
    /// bodies become `InvalidResponse`.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, StepError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, "sending step request");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| StepError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StepError::status(status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StepError::network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StepError::invalid_response(e.to_string()))
    }
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
