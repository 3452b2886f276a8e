//! # docchat-model
//!
//! Conversation turns and streaming completion clients for docchat.
//!
//! ## Overview
//!
//! - [`Turn`] / [`Role`] - the role-tagged messages sent to a chat model
//! - [`CompletionClient`] - the streaming completion boundary
//! - [`ResponseAccumulator`] - incremental consumption of a [`FragmentStream`]
//! - [`OpenAIClient`] - OpenAI and OpenAI-compatible APIs (feature `openai`)
//! - [`MockCompletionClient`] - scripted client for tests
//! - [`wait_for_run`] - bounded-backoff polling of remote runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docchat_model::openai::{OpenAIClient, OpenAIConfig};
//! use docchat_model::{CompletionClient, ResponseAccumulator, Turn};
//!
//! let client = OpenAIClient::new(OpenAIConfig::from_env()?)?;
//! let stream = client
//!     .complete_stream(vec![Turn::system("Be brief."), Turn::user("What is RAG?")])
//!     .await?;
//!
//! let mut answer = ResponseAccumulator::new(stream);
//! while let Some(partial) = answer.next().await {
//!     render(partial?);
//! }
//! ```

pub mod accumulator;
pub mod completion;
pub mod error;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod run;
pub mod turn;

pub use accumulator::ResponseAccumulator;
pub use completion::{CompletionClient, FragmentStream};
pub use error::{ModelError, Result};
pub use mock::MockCompletionClient;
#[cfg(feature = "openai")]
pub use openai::{OpenAIClient, OpenAIConfig};
pub use run::{PollPolicy, RunSource, RunStatus, wait_for_run};
pub use turn::{Role, Turn};
