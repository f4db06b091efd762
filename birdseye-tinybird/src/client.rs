use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::AnalyticsEvent;

#[derive(Debug, Error)]
pub enum TinybirdError {
    #[error("invalid configuration: TINYBIRD_TOKEN is required")]
    MissingToken,
    #[error("invalid configuration: host cannot be empty")]
    EmptyHost,
    #[error("invalid configuration: datasource cannot be empty")]
    EmptyDatasource,
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Reply from the events endpoint. The status is kept for diagnostics only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone)]
pub struct TinybirdClient {
    client: Client,
    host: String,
    token: SecretString,
    datasource: String,
}

impl std::fmt::Debug for TinybirdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TinybirdClient")
            .field("host", &self.host)
            .field("datasource", &self.datasource)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TinybirdClient {
    pub fn new(host: impl Into<String>, token: SecretString, datasource: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            host: host.into(),
            token,
            datasource: datasource.into(),
        }
    }

    pub fn events_url(&self) -> String {
        format!(
            "{}/v0/events?name={}",
            self.host.trim_end_matches('/'),
            self.datasource
        )
    }

    /// Posts one event. Non-2xx replies are not errors: the body is returned
    /// as-is so callers can log it.
    pub async fn send_event(&self, event: &AnalyticsEvent) -> Result<IngestResponse, TinybirdError> {
        let body = serde_json::to_string(event)?;
        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(self.token.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok(IngestResponse { status, body })
    }
}
