use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
    Client,
};
use common::error::AppError;
use tracing::debug;

/// Sends an assembled prompt to the chat-completion endpoint and returns
/// the generated text. Single attempt; surfacing a failure is the caller's
/// job. The `Scripted` backend exists for tests that need a deterministic
/// answer or a deterministic failure.
#[derive(Clone)]
pub struct AnswerGenerator {
    inner: GeneratorInner,
}

#[derive(Clone)]
enum GeneratorInner {
    Chat {
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        temperature: Option<f32>,
    },
    #[cfg(any(test, feature = "test-utils"))]
    Scripted(ScriptedResponse),
}

#[cfg(any(test, feature = "test-utils"))]
#[derive(Clone)]
pub enum ScriptedResponse {
    Answer(String),
    Failure(String),
}

impl AnswerGenerator {
    pub fn new_chat(
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        temperature: Option<f32>,
    ) -> Self {
        AnswerGenerator {
            inner: GeneratorInner::Chat {
                client,
                model,
                temperature,
            },
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_scripted(response: ScriptedResponse) -> Self {
        AnswerGenerator {
            inner: GeneratorInner::Scripted(response),
        }
    }

    pub async fn generate(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, AppError> {
        match &self.inner {
            #[cfg(any(test, feature = "test-utils"))]
            GeneratorInner::Scripted(response) => match response {
                ScriptedResponse::Answer(answer) => Ok(answer.clone()),
                ScriptedResponse::Failure(message) => {
                    Err(AppError::GenerationService(message.clone()))
                }
            },
            GeneratorInner::Chat {
                client,
                model,
                temperature,
            } => {
                let mut builder = CreateChatCompletionRequestArgs::default();
                builder.model(model.clone()).messages(messages);
                if let Some(temperature) = temperature {
                    builder.temperature(*temperature);
                }
                let request = builder.build().map_err(map_openai_error)?;

                let response = client
                    .chat()
                    .create(request)
                    .await
                    .map_err(map_openai_error)?;

                let answer = response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| {
                        AppError::MalformedResponse(
                            "chat completion response contained no answer content".to_string(),
                        )
                    })?;

                debug!(answer_chars = answer.chars().count(), "Generated answer");
                Ok(answer)
            }
        }
    }
}

/// The upstream-reported message is kept when the API sent one; everything
/// else (timeouts, transport failures, bad requests) falls back to the
/// client error's own description.
fn map_openai_error(err: OpenAIError) -> AppError {
    match err {
        OpenAIError::ApiError(api) => AppError::GenerationService(api.message),
        other => AppError::GenerationService(other.to_string()),
    }
}
