//! Scripted completion client for tests and offline runs.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use crate::completion::{CompletionClient, FragmentStream};
use crate::error::{ModelError, Result};
use crate::turn::Turn;

/// A [`CompletionClient`] that replays a fixed list of fragments.
///
/// Optionally fails after a given number of fragments, which is how
/// mid-stream failures are exercised. Every request is recorded and can be
/// inspected with [`requests`](MockCompletionClient::requests).
///
/// # Example
///
/// ```rust,ignore
/// use docchat_model::MockCompletionClient;
///
/// let client = MockCompletionClient::new(["Paris", " is the capital."])
///     .fail_after(1, "connection reset");
/// ```
pub struct MockCompletionClient {
    fragments: Vec<String>,
    failure: Option<(usize, String)>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl MockCompletionClient {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Emit `count` fragments, then a [`ModelError::Completion`] carrying `message`.
    pub fn fail_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.failure = Some((count, message.into()));
        self
    }

    /// The turn sequences received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete_stream(&self, turns: Vec<Turn>) -> Result<FragmentStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(turns);
        }

        let mut items: Vec<Result<String>> = match &self.failure {
            Some((count, _)) => self.fragments.iter().take(*count).cloned().map(Ok).collect(),
            None => self.fragments.iter().cloned().map(Ok).collect(),
        };
        if let Some((_, message)) = &self.failure {
            items.push(Err(ModelError::completion("mock", message.clone())));
        }

        Ok(Box::pin(stream::iter(items)))
    }
}
