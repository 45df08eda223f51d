use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::transport::{HttpTransport, ReqwestTransport};
use crate::error::CompletionError;

pub const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MAX_COMPLETION_TOKENS: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// JSON body of a chat-completions POST
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Everything needed for one send. Built fresh for each attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub api_key: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub max_completion_tokens: u32,
}

impl CompletionRequest {
    pub fn new(
        prompt: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            api_key: api_key.into(),
            model: model.into(),
            system_instruction: None,
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        }
    }

    pub fn with_system_instruction(mut self, instruction: Option<impl Into<String>>) -> Self {
        self.system_instruction = instruction.map(Into::into);
        self
    }

    /// System message first when present, then the prompt as the user message
    pub fn to_wire(&self) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(instruction) = &self.system_instruction {
            messages.push(ChatMessage {
                role: Role::System,
                content: instruction.clone(),
            });
        }
        messages.push(ChatMessage {
            role: Role::User,
            content: self.prompt.clone(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: self.max_completion_tokens,
        }
    }
}

/// Single-shot client for the chat-completions endpoint. Holds no per-call state.
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
}

impl Default for CompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionClient {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            endpoint: CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn complete(
        &self,
        prompt: &str,
        api_key: &str,
        model: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, CompletionError> {
        let request =
            CompletionRequest::new(prompt, api_key, model).with_system_instruction(system_instruction);
        self.send(&request).await
    }

    pub async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        if request.api_key.is_empty() {
            return Err(CompletionError::MissingCredential);
        }

        let body = request.to_wire();
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            endpoint = %self.endpoint,
            "sending chat completion"
        );

        let reply = self
            .transport
            .post_chat(&self.endpoint, &request.api_key, &body)
            .await?;

        debug!(status = reply.status, bytes = reply.body.len(), "chat completion reply");

        if reply.status != 200 {
            let message = serde_json::from_slice::<ErrorEnvelope>(&reply.body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", reply.status));
            return Err(CompletionError::ApiError(message));
        }

        let response: ChatCompletionResponse =
            serde_json::from_slice(&reply.body).map_err(|_| CompletionError::InvalidResponse)?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(CompletionError::InvalidResponse)
    }
}
