//! Ollama chat endpoint as a root-cause oracle

use super::oracle::{OracleError, OracleRequest, RootCauseOracle};
use crate::config::OracleConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// Oracle backed by `POST {base_url}/api/chat` in JSON mode
pub struct OllamaOracle {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RootCauseOracle for OllamaOracle {
    async fn complete(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            format: "json",
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("unexpected chat response: {}", e)))?;

        debug!(model = %self.model, bytes = reply.message.content.len(), "Ollama reply received");
        Ok(reply.message.content)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
