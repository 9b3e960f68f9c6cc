//! Text generation through a local Ollama server.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use ureq::Agent;

use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::translator::TextGenerator;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

/// Blocking client for Ollama's `/api/chat`, one user message per call.
pub struct OllamaGenerator {
    agent: Agent,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            endpoint: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let start_time = std::time::Instant::now();
        let mut response = self
            .agent
            .post(&self.endpoint)
            .send_json(&request)
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => GenerationError::Status {
                    status,
                    message: format!("{} rejected the request", self.endpoint),
                },
                other => GenerationError::Unreachable(other.to_string()),
            })?;

        let reply: ChatResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| GenerationError::Envelope(e.to_string()))?;
        log::debug!(
            "{} answered in {:?}",
            self.model,
            start_time.elapsed()
        );

        Ok(reply.message.content)
    }
}
