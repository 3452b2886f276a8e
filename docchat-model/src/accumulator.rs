//! Incremental consumption of a [`FragmentStream`].

use futures::StreamExt;
use tracing::{debug, error};

use crate::completion::FragmentStream;
use crate::error::{ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    Finished,
    Failed,
}

/// Pulls fragments from a completion stream and accumulates the response.
///
/// Every successful [`next`](ResponseAccumulator::next) call appends one
/// fragment and returns the whole response so far, so callers can redraw
/// the growing answer after each fragment. A stream error is returned once;
/// the text received before it stays available through
/// [`response`](ResponseAccumulator::response). Dropping the accumulator
/// stops consumption, and whatever was received up to that point is a
/// valid partial answer.
pub struct ResponseAccumulator {
    stream: FragmentStream,
    response: String,
    last_fragment_start: usize,
    fragments: usize,
    state: State,
}

impl ResponseAccumulator {
    pub fn new(stream: FragmentStream) -> Self {
        Self {
            stream,
            response: String::new(),
            last_fragment_start: 0,
            fragments: 0,
            state: State::Streaming,
        }
    }

    /// Pull the next fragment.
    ///
    /// Returns `Some(Ok(response_so_far))` after each fragment,
    /// `Some(Err(_))` once if the stream fails, and `None` when the stream
    /// is exhausted or has already failed.
    pub async fn next(&mut self) -> Option<Result<&str>> {
        if self.state != State::Streaming {
            return None;
        }

        match self.stream.next().await {
            Some(Ok(fragment)) => {
                self.last_fragment_start = self.response.len();
                self.response.push_str(&fragment);
                self.fragments += 1;
                Some(Ok(&self.response))
            }
            Some(Err(e)) => {
                error!(fragments = self.fragments, error = %e, "completion stream failed");
                self.state = State::Failed;
                Some(Err(e))
            }
            None => {
                debug!(
                    fragments = self.fragments,
                    chars = self.response.len(),
                    "completion stream finished"
                );
                self.state = State::Finished;
                None
            }
        }
    }

    /// The response accumulated so far.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The text of the most recently appended fragment.
    pub fn latest_fragment(&self) -> &str {
        &self.response[self.last_fragment_start..]
    }

    /// Number of fragments received.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// `true` once the stream ended cleanly.
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// `true` once the stream delivered an error.
    pub fn is_failed(&self) -> bool {
        self.state == State::Failed
    }

    /// Consume the remaining stream, returning the full response and the
    /// terminal error, if any.
    pub async fn finish(mut self) -> (String, Option<ModelError>) {
        let mut failure = None;
        while let Some(item) = self.next().await {
            if let Err(e) = item {
                failure = Some(e);
            }
        }
        (self.response, failure)
    }

    /// Give up the accumulated response without reading further.
    pub fn into_response(self) -> String {
        self.response
    }
}
