//! Tinybird analytics for birdseye language models.
//!
//! [`wrap_model`] decorates any [`LanguageModel`](birdseye_core::LanguageModel)
//! so every `generate` and `stream` call posts one [`AnalyticsEvent`] to the
//! Tinybird events API. The wrapped model returns exactly what the inner model
//! returns; delivery failures are logged and dropped.
//!
//! ```rust,no_run
//! use birdseye_core::{CallOptions, LanguageModel};
//! use birdseye_tinybird::{wrap_model, TinybirdConfig};
//! use secrecy::SecretString;
//!
//! # async fn run(model: impl LanguageModel) -> Result<(), birdseye_core::ModelError> {
//! let config = TinybirdConfig::new(
//!     SecretString::new("p.token".to_string()),
//!     "https://api.tinybird.co",
//! )
//! .project("support-bot")
//! .environment("staging");
//!
//! let model = wrap_model(model, config);
//! let completion = model.generate(CallOptions::new("hello")).await?;
//! println!("{:?}", completion.text);
//! # Ok(())
//! # }
//! ```
mod client;
mod compose;
mod config;
mod delivery;
mod events;
mod sanitize;
mod sink;
mod wrapper;

pub use client::{IngestResponse, TinybirdClient, TinybirdError};
pub use compose::{
    CallOutcome, CallRecord, Clock, EventComposer, IdGenerator, ModelIdentity, SystemClock,
    UuidGenerator,
};
pub use config::{
    DeliveryMode, EventTags, TinybirdConfig, DEFAULT_DATASOURCE, DEFAULT_HOST,
    DEFAULT_MAX_CONTENT_BYTES,
};
pub use delivery::FlushError;
pub use events::{
    AnalyticsEvent, ChoiceMessage, EventChoice, EventFailure, EventMessage, EventResponse,
    EventStatus, EventUsage, ProxyMetadata,
};
pub use sanitize::{redact_text, truncate_text, Sanitizer};
pub use sink::{EventSink, TinybirdSink};
pub use wrapper::{wrap_model, wrap_openai, TinybirdModel};
