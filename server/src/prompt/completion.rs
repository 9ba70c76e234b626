use std::sync::Arc;

use async_trait::async_trait;
use derive_more::derive::Display;
use serde::{Deserialize, Serialize};

use crate::{
    server_config::{ApiConfig, ModelConfig},
    HttpClient,
};

/// Failure talking to the completion provider. `status` is the HTTP status
/// when the provider answered at all.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("completion provider error ({status:?}): {message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        tracing::error!("Completion API transport error: {:?}", error);
        ProviderError {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Turns a prompt into the provider's raw reply text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub type CompletionProviderHandle = Arc<dyn CompletionProvider>;

/// Single-shot chat completions client. No retry, no caching.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http_client: HttpClient,
    endpoint: String,
    api_key: String,
    model: String,
    referer: Option<String>,
    title: Option<String>,
}

impl CompletionClient {
    pub fn new(http_client: HttpClient, api: &ApiConfig, model: &ModelConfig) -> Self {
        Self {
            http_client,
            endpoint: api.endpoint.clone(),
            api_key: api.key.clone(),
            model: model.id.clone(),
            referer: api.referer.clone(),
            title: api.title.clone(),
        }
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut req = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ChatApiRequest {
                model: &self.model,
                messages: vec![ChatRequestMessage {
                    role: "user",
                    content: prompt,
                }],
            });
        if let Some(referer) = &self.referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            req = req.header("X-Title", title);
        }

        tracing::debug!("Sending prompt to {} using {}", self.endpoint, self.model);
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!("Completion API error {}: {}", status, message);
            return Err(ProviderError {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed = serde_json::from_str::<ChatApiResponseOrError>(&body).map_err(|e| {
            tracing::error!("Could not parse chat response: {}", body);
            ProviderError {
                status: Some(status.as_u16()),
                message: format!("Malformed completion response: {}", e),
            }
        })?;

        let parsed = match parsed {
            ChatApiResponseOrError::Error(ChatApiErrorResponse { error }) => {
                tracing::error!("Chat API error: {:?}", error);
                return Err(ProviderError {
                    status: Some(error.code.unwrap_or(status.as_u16())),
                    message: error.message,
                });
            }
            ChatApiResponseOrError::Response(parsed) => parsed,
        };

        if let Some(usage) = &parsed.usage {
            tracing::debug!("Completion token usage: {}", usage.total_tokens);
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError {
                status: Some(status.as_u16()),
                message: "No choices in response".to_string(),
            })?;

        tracing::debug!(
            "Completion response: {}",
            content.chars().take(200).collect::<String>()
        );

        Ok(content)
    }
}

fn error_message(body: &str) -> String {
    if let Ok(ChatApiErrorResponse { error }) = serde_json::from_str(body) {
        return error.message;
    }
    if let Ok(error) = serde_json::from_str::<ChatApiError>(body) {
        return error.message;
    }
    body.to_string()
}

#[derive(Debug, Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: Option<i32>,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<PromptUsage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiError {
    pub message: String,
    pub code: Option<u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiErrorResponse {
    pub error: ChatApiError,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatApiResponseOrError {
    Response(ChatApiResponse),
    Error(ChatApiErrorResponse),
}
