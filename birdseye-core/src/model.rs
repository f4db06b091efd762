use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{CallOptions, Completion, ModelError, StreamPart};

/// In-flight token stream returned by [`LanguageModel::stream`].
pub type StreamHandle = BoxStream<'static, Result<StreamPart, ModelError>>;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> Option<&str> {
        None
    }

    fn provider(&self) -> Option<&str> {
        None
    }

    async fn generate(&self, options: CallOptions) -> Result<Completion, ModelError>;

    async fn stream(&self, options: CallOptions) -> Result<StreamHandle, ModelError>;
}

#[async_trait]
impl<M> LanguageModel for Arc<M>
where
    M: LanguageModel + ?Sized,
{
    fn model_id(&self) -> Option<&str> {
        (**self).model_id()
    }

    fn provider(&self) -> Option<&str> {
        (**self).provider()
    }

    async fn generate(&self, options: CallOptions) -> Result<Completion, ModelError> {
        (**self).generate(options).await
    }

    async fn stream(&self, options: CallOptions) -> Result<StreamHandle, ModelError> {
        (**self).stream(options).await
    }
}

#[async_trait]
impl<M> LanguageModel for Box<M>
where
    M: LanguageModel + ?Sized,
{
    fn model_id(&self) -> Option<&str> {
        (**self).model_id()
    }

    fn provider(&self) -> Option<&str> {
        (**self).provider()
    }

    async fn generate(&self, options: CallOptions) -> Result<Completion, ModelError> {
        (**self).generate(options).await
    }

    async fn stream(&self, options: CallOptions) -> Result<StreamHandle, ModelError> {
        (**self).stream(options).await
    }
}
