//! Analytics instrumentation for language-model clients.
//!
//! Re-exports the model capability from `birdseye-core` and, with the default
//! `tinybird` feature, the Tinybird wrapper under [`tinybird`].
pub use birdseye_core::{
    CallOptions, Completion, LanguageModel, Message, ModelError, Prompt, Role, StreamHandle,
    StreamPart, Usage,
};

#[cfg(feature = "tinybird")]
pub use birdseye_tinybird as tinybird;

#[cfg(feature = "tinybird")]
pub use birdseye_tinybird::{wrap_model, wrap_openai, TinybirdConfig, TinybirdModel};

pub mod prelude {
    pub use birdseye_core::{CallOptions, Completion, LanguageModel, ModelError, Prompt};

    #[cfg(feature = "tinybird")]
    pub use birdseye_tinybird::{wrap_model, DeliveryMode, TinybirdConfig};
}
