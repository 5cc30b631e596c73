//! Anthropic Claude adapter.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, OracleResult};
use crate::oracles::{TextCompletion, MAX_COMPLETION_TOKENS};

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Claude-backed oracle using the Messages API.
#[derive(Clone)]
pub struct ClaudeOracle {
    client: Client,
    api_key: SecretString,
    model: String,
}

impl ClaudeOracle {
    /// Create an adapter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from `ANTHROPIC_API_KEY`, honoring `ANTHROPIC_API_MODEL`.
    pub fn from_env() -> OracleResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| OracleError::Config {
            reason: "ANTHROPIC_API_KEY environment variable not set".to_string(),
        })?;
        let mut oracle = Self::new(api_key);
        if let Ok(model) = std::env::var("ANTHROPIC_API_MODEL") {
            oracle.model = model;
        }
        Ok(oracle)
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextCompletion for ClaudeOracle {
    async fn complete(&self, prompt: &str) -> OracleResult<String> {
        #[derive(Serialize)]
        struct MessagesRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            messages: Vec<Message<'a>>,
        }

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct MessagesResponse {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(default)]
            text: String,
        }

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_COMPLETION_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Api(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::MalformedResponse {
                reason: format!("messages API returned {status}: {body}"),
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Api(Box::new(e)))?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or(OracleError::EmptyResponse)
    }

    fn provider_name(&self) -> &str {
        "claude"
    }
}
