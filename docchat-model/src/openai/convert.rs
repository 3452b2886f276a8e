//! Conversions between docchat turns and `async-openai` types.

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionStreamResponse,
};

use crate::error::{ModelError, Result};
use crate::turn::{Role, Turn};

pub(super) const PROVIDER: &str = "OpenAI";

/// Convert a [`Turn`] into a chat completion request message.
pub(super) fn turn_to_message(turn: &Turn) -> Result<ChatCompletionRequestMessage> {
    let content = turn.content.clone();
    let message: std::result::Result<ChatCompletionRequestMessage, OpenAIError> = match turn.role
    {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        Role::User => {
            ChatCompletionRequestUserMessageArgs::default().content(content).build().map(Into::into)
        }
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
    };
    message
        .map_err(|e| ModelError::completion(PROVIDER, format!("invalid {} turn: {e}", turn.role)))
}

/// Extract the text delta carried by a streamed chunk, if any.
pub(super) fn chunk_text(chunk: &CreateChatCompletionStreamResponse) -> Option<String> {
    chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.content.clone())
        .filter(|text| !text.is_empty())
}
