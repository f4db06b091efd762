use async_trait::async_trait;

use crate::{AnalyticsEvent, TinybirdClient, TinybirdConfig};

/// Destination for composed events.
///
/// Implementations must swallow their own failures: `deliver` has no error
/// channel back to the wrapped call.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &AnalyticsEvent);
}

/// Sends events to the Tinybird events API, one request per event.
#[derive(Clone, Debug)]
pub struct TinybirdSink {
    client: TinybirdClient,
}

impl TinybirdSink {
    pub fn new(config: &TinybirdConfig) -> Self {
        Self {
            client: TinybirdClient::new(
                config.host.clone(),
                config.token.clone(),
                config.datasource.clone(),
            ),
        }
    }

    pub fn from_client(client: TinybirdClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSink for TinybirdSink {
    async fn deliver(&self, event: &AnalyticsEvent) {
        match self.client.send_event(event).await {
            Ok(response) => {
                tracing::debug!(
                    event_id = %event.id,
                    status = %response.status,
                    body = %response.body,
                    "tinybird event delivered"
                );
            }
            Err(err) => {
                tracing::warn!(
                    event_id = %event.id,
                    error = %err,
                    "failed to deliver tinybird event"
                );
            }
        }
    }
}
