//! OpenAI chat-completions client.
//!
//! Talks to the OpenAI API (or any OpenAI-compatible endpoint) through
//! `async-openai` and always requests a streamed response.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let client = OpenAIClient::new(OpenAIConfig::from_env()?.with_model("gpt-4o-mini"))?;
//! ```

mod client;
mod config;
mod convert;

pub use client::OpenAIClient;
pub use config::{DEFAULT_MODEL, OpenAIConfig};
