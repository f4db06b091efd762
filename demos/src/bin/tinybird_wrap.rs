//! Wraps a local echo model and sends its call events to Tinybird.
//!
//! Set `TINYBIRD_TOKEN` (and optionally `TINYBIRD_HOST`, `TINYBIRD_PROJECT`, ...)
//! in the environment or a `.env` file, then:
//!
//! ```sh
//! RUST_LOG=birdseye_tinybird=debug cargo run -p birdseye-demos --bin tinybird_wrap
//! ```
use std::time::Duration;

use async_trait::async_trait;
use birdseye_core::{
    CallOptions, Completion, LanguageModel, Message, ModelError, Prompt, StreamHandle, StreamPart,
    Usage,
};
use birdseye_tinybird::{wrap_model, DeliveryMode, TinybirdConfig};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    fn model_id(&self) -> Option<&str> {
        Some("echo-1")
    }

    fn provider(&self) -> Option<&str> {
        Some("local")
    }

    async fn generate(&self, options: CallOptions) -> Result<Completion, ModelError> {
        let text = match options.prompt {
            Some(Prompt::Text(text)) => text,
            Some(Prompt::Messages(messages)) => messages
                .last()
                .map(|message| message.content.clone())
                .unwrap_or_default(),
            None => return Err(ModelError::InvalidRequest("prompt is required".to_string())),
        };
        let tokens = text.split_whitespace().count() as u32;
        Ok(Completion::text(text.to_uppercase()).with_usage(Usage::new(tokens, tokens)))
    }

    async fn stream(&self, options: CallOptions) -> Result<StreamHandle, ModelError> {
        let completion = self.generate(options).await?;
        let words: Vec<_> = completion
            .text
            .unwrap_or_default()
            .split_whitespace()
            .map(|word| Ok(StreamPart::TextDelta(format!("{word} "))))
            .collect();
        Ok(futures::stream::iter(words).boxed())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = TinybirdConfig::from_env()?
        .event("demo_completion")
        .delivery_mode(DeliveryMode::Detached);
    let model = wrap_model(EchoModel, config);

    let completion = model.generate(CallOptions::new("hello from birdseye")).await?;
    tracing::info!(text = ?completion.text, "generate finished");

    let chat = CallOptions::new(vec![
        Message::system("repeat the user"),
        Message::user("streaming works too"),
    ]);
    let mut stream = model.stream(chat).await?;
    while let Some(part) = stream.next().await {
        if let StreamPart::TextDelta(delta) = part? {
            print!("{delta}");
        }
    }
    println!();

    if let Err(err) = model.generate(CallOptions::default()).await {
        tracing::info!(error = %err, "expected failure was reported");
    }

    model.flush(Duration::from_secs(10)).await?;
    Ok(())
}
