use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use birdseye_core::{CallOptions, Completion, LanguageModel, ModelError, StreamHandle};
use chrono::{DateTime, Utc};

use crate::compose::{CallOutcome, CallRecord, Clock, IdGenerator, ModelIdentity};
use crate::delivery::Dispatcher;
use crate::{EventComposer, EventSink, FlushError, TinybirdConfig, TinybirdError, TinybirdSink};

/// A [`LanguageModel`] that reports every call to Tinybird.
///
/// Results and errors from the inner model are returned untouched. Each call
/// produces exactly one event and one delivery attempt, made after the inner
/// call settles.
#[derive(Clone)]
pub struct TinybirdModel<M> {
    inner: M,
    config: Arc<TinybirdConfig>,
    composer: EventComposer,
    dispatcher: Dispatcher,
}

impl<M: LanguageModel> TinybirdModel<M> {
    pub fn new(inner: M, config: TinybirdConfig) -> Self {
        let sink = Arc::new(TinybirdSink::new(&config));
        Self::with_sink(inner, config, sink)
    }

    pub fn try_new(inner: M, config: TinybirdConfig) -> Result<Self, TinybirdError> {
        config.validate()?;
        Ok(Self::new(inner, config))
    }

    pub fn with_sink(inner: M, config: TinybirdConfig, sink: Arc<dyn EventSink>) -> Self {
        let composer = EventComposer::new(&config);
        let dispatcher = Dispatcher::new(sink, config.delivery_mode);
        Self {
            inner,
            config: Arc::new(config),
            composer,
            dispatcher,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.composer = self.composer.with_clock(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.composer = self.composer.with_id_generator(ids);
        self
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }

    pub fn config(&self) -> &TinybirdConfig {
        &self.config
    }

    /// Deliveries spawned in detached mode that have not finished yet.
    pub fn pending_deliveries(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Waits for detached deliveries. Returns immediately in inline mode.
    pub async fn flush(&self, timeout: Duration) -> Result<(), FlushError> {
        self.dispatcher.flush(timeout).await
    }

    fn identity(&self) -> ModelIdentity<'_> {
        ModelIdentity {
            model_id: self.inner.model_id(),
            provider: self.inner.provider(),
        }
    }

    async fn report(
        &self,
        options: &CallOptions,
        start_time: DateTime<Utc>,
        outcome: CallOutcome<'_>,
    ) {
        let event = self.composer.compose(CallRecord {
            identity: self.identity(),
            start_time,
            outcome,
            options,
        });
        self.dispatcher.dispatch(event).await;
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for TinybirdModel<M> {
    fn model_id(&self) -> Option<&str> {
        self.inner.model_id()
    }

    fn provider(&self) -> Option<&str> {
        self.inner.provider()
    }

    async fn generate(&self, options: CallOptions) -> Result<Completion, ModelError> {
        let start_time = self.composer.now();
        // The inner model consumes the options; keep a copy for the event.
        let result = self.inner.generate(options.clone()).await;

        let outcome = match &result {
            Ok(completion) => CallOutcome::Generated(completion),
            Err(err) => CallOutcome::Failed(err),
        };
        self.report(&options, start_time, outcome).await;
        result
    }

    async fn stream(&self, options: CallOptions) -> Result<StreamHandle, ModelError> {
        let start_time = self.composer.now();
        let result = self.inner.stream(options.clone()).await;

        let outcome = match &result {
            Ok(_) => CallOutcome::Streamed,
            Err(err) => CallOutcome::Failed(err),
        };
        self.report(&options, start_time, outcome).await;
        result
    }
}

/// Wraps `model` so that each `generate` and `stream` call emits one event.
pub fn wrap_model<M: LanguageModel>(model: M, config: TinybirdConfig) -> TinybirdModel<M> {
    TinybirdModel::new(model, config)
}

/// Same as [`wrap_model`]; kept for callers wrapping OpenAI-backed models.
pub fn wrap_openai<M: LanguageModel>(model: M, config: TinybirdConfig) -> TinybirdModel<M> {
    wrap_model(model, config)
}
