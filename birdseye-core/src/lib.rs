//! Language-model capability shared by every birdseye integration.
//!
//! A model exposes two operations: a single-shot [`LanguageModel::generate`]
//! and a streaming [`LanguageModel::stream`]. Instrumentation layers wrap a
//! value implementing this trait and hand back another implementation of it.
mod error;
mod llm;
mod model;

pub use error::ModelError;
pub use llm::{CallOptions, Completion, Message, Prompt, Role, StreamPart, Usage};
pub use model::{LanguageModel, StreamHandle};

pub use serde_json::Value;
