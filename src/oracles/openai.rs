//! OpenAI chat-completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, OracleResult};
use crate::oracles::{TextCompletion, MAX_COMPLETION_TOKENS};

const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-backed oracle. Also the transport for any provider exposing
/// an OpenAI-compatible API behind a custom base URL.
#[derive(Clone)]
pub struct OpenAiOracle {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiOracle {
    /// Create an adapter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from `OPENAI_API_KEY`, honoring `OPENAI_API_MODEL`.
    pub fn from_env() -> OracleResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| OracleError::Config {
            reason: "OPENAI_API_KEY environment variable not set".to_string(),
        })?;
        let mut oracle = Self::new(api_key);
        if let Ok(model) = std::env::var("OPENAI_API_MODEL") {
            oracle.model = model;
        }
        Ok(oracle)
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (Azure, proxies, OpenAI-compatible APIs).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) async fn chat(&self, prompt: &str) -> OracleResult<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            max_tokens: u32,
        }

        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }

        #[derive(Deserialize)]
        struct Message {
            content: String,
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Api(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::MalformedResponse {
                reason: format!("chat completions returned {status}: {body}"),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Api(Box::new(e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OracleError::EmptyResponse)
    }
}

#[async_trait]
impl TextCompletion for OpenAiOracle {
    async fn complete(&self, prompt: &str) -> OracleResult<String> {
        self.chat(prompt).await
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
