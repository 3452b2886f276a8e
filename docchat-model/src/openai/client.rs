//! OpenAI client implementation.

use async_openai::Client;
use async_openai::config::OpenAIConfig as AsyncOpenAIConfig;
use async_openai::types::CreateChatCompletionRequestArgs;
use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error};

use super::config::OpenAIConfig;
use super::convert::{self, PROVIDER};
use crate::completion::{CompletionClient, FragmentStream};
use crate::error::{ModelError, Result};
use crate::turn::Turn;

/// Streaming client for the OpenAI chat completions API and compatible servers.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the API key is empty.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Config("OpenAI API key must not be empty".to_string()));
        }

        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self { client: Client::with_config(openai_config), model: config.model })
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete_stream(&self, turns: Vec<Turn>) -> Result<FragmentStream> {
        let messages = turns.iter().map(convert::turn_to_message).collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .stream(true)
            .build()
            .map_err(|e| {
                ModelError::completion(PROVIDER, format!("failed to build request: {e}"))
            })?;

        debug!(model = %self.model, turns = turns.len(), "starting completion stream");

        let mut chunks = self.client.chat().create_stream(request).await.map_err(|e| {
            error!(model = %self.model, error = %e, "completion request failed");
            ModelError::completion(PROVIDER, format!("API error: {e}"))
        })?;

        let fragments = stream! {
            while let Some(result) = chunks.next().await {
                match result {
                    Ok(chunk) => {
                        if let Some(text) = convert::chunk_text(&chunk) {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(ModelError::completion(PROVIDER, format!("stream error: {e}")));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(fragments))
    }
}
