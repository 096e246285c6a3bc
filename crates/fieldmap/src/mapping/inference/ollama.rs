use serde::Deserialize;

use super::prompt::ChatRequest;
use super::{BackendError, InferenceBackend};
use crate::config::InferenceConfig;

/// HTTP client for an Ollama-compatible `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    chat_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| BackendError::Transport(format!("http client setup failed: {err}")))?;

        Ok(Self {
            http,
            chat_url: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

impl InferenceBackend for OllamaClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, BackendError> {
        let response = self
            .http
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;

        Ok(payload.message.map(|reply| reply.content).unwrap_or_default())
    }
}
