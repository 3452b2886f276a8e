//! The completion client boundary.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::turn::Turn;

/// A lazy, finite, non-restartable sequence of text fragments.
///
/// The stream ends after the last fragment. A failure is delivered as an
/// `Err` item; consumers should stop polling after the first error.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A hosted chat-completion model that streams its answer.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_model::{CompletionClient, ResponseAccumulator, Turn};
///
/// let stream = client.complete_stream(vec![Turn::user("Hello")]).await?;
/// let mut answer = ResponseAccumulator::new(stream);
/// while let Some(partial) = answer.next().await {
///     println!("{}", partial?);
/// }
/// ```
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// The model name this client talks to.
    fn name(&self) -> &str;

    /// Send `turns` and return the streamed response fragments.
    ///
    /// Fails with [`ModelError::Completion`](crate::ModelError::Completion)
    /// if the request cannot be started.
    async fn complete_stream(&self, turns: Vec<Turn>) -> Result<FragmentStream>;
}
