//! Chat-completions client implementing [`Mutator`].

use crate::prompt::{build_prompt, clean_code};
use async_trait::async_trait;
use quine_core::ProposerSettings;
use quine_evolution::{MutationError, Mutator};
use reqwest::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(serde::Deserialize)]
struct Choice {
    message: Message,
}

#[derive(serde::Deserialize)]
struct Message {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions proposer.
#[derive(Clone)]
pub struct LlmMutator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl LlmMutator {
    /// Create a proposer from settings.
    pub fn new(settings: &ProposerSettings) -> Result<Self, MutationError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MutationError::Transport(e.to_string()))?;
        if settings.api_key.is_none() {
            warn!("No API key configured; requests to {} are sent unauthenticated", settings.api_url);
        }
        Ok(Self {
            client,
            url: settings.api_url.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_key: settings.api_key.clone(),
        })
    }

    /// Model requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Mutator for LlmMutator {
    async fn mutate(&self, current: &str) -> Result<String, MutationError> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": build_prompt(current) }],
            "temperature": self.temperature,
        });

        debug!(model = %self.model, "Requesting mutation");

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| MutationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MutationError::Response(format!("status {}: {}", status, error_text)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| MutationError::Response(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MutationError::Response("no message in response".to_string()))?;

        let code = clean_code(&content);
        if code.is_empty() {
            return Err(MutationError::Empty);
        }
        Ok(code)
    }
}
