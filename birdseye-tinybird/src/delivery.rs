use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::task::TaskTracker;

use crate::{AnalyticsEvent, DeliveryMode, EventSink};

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("flush timed out after {waited:?} with {pending} deliveries pending")]
    Timeout { waited: Duration, pending: usize },
}

/// Hands each event to the sink exactly once, inline or on a tracked task.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    sink: Arc<dyn EventSink>,
    mode: DeliveryMode,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub(crate) fn new(sink: Arc<dyn EventSink>, mode: DeliveryMode) -> Self {
        Self {
            sink,
            mode,
            tracker: TaskTracker::new(),
        }
    }

    pub(crate) async fn dispatch(&self, event: AnalyticsEvent) {
        match self.mode {
            DeliveryMode::Inline => self.sink.deliver(&event).await,
            DeliveryMode::Detached => {
                let sink = self.sink.clone();
                self.tracker.spawn(async move {
                    sink.deliver(&event).await;
                });
            }
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub(crate) async fn flush(&self, timeout: Duration) -> Result<(), FlushError> {
        let start = Instant::now();
        self.tracker.close();
        let waited = tokio::time::timeout(timeout, self.tracker.wait()).await;
        self.tracker.reopen();
        match waited {
            Ok(()) => Ok(()),
            Err(_) => Err(FlushError::Timeout {
                waited: start.elapsed(),
                pending: self.tracker.len(),
            }),
        }
    }
}
