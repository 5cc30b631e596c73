//! xAI Grok adapter.
//!
//! Grok exposes an OpenAI-compatible API, so this adapter is the
//! OpenAI transport pointed at the xAI endpoint.

use async_trait::async_trait;

use crate::error::{OracleError, OracleResult};
use crate::oracles::{OpenAiOracle, TextCompletion};

const DEFAULT_MODEL: &str = "grok-beta";
const BASE_URL: &str = "https://api.x.ai/v1";

/// Grok-backed oracle.
#[derive(Clone)]
pub struct GrokOracle {
    inner: OpenAiOracle,
}

impl GrokOracle {
    /// Create an adapter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            inner: OpenAiOracle::new(api_key)
                .with_model(DEFAULT_MODEL)
                .with_base_url(BASE_URL),
        }
    }

    /// Create from `XAI_API_KEY`, honoring `XAI_API_MODEL`.
    pub fn from_env() -> OracleResult<Self> {
        let api_key = std::env::var("XAI_API_KEY").map_err(|_| OracleError::Config {
            reason: "XAI_API_KEY environment variable not set".to_string(),
        })?;
        let mut oracle = Self::new(api_key);
        if let Ok(model) = std::env::var("XAI_API_MODEL") {
            oracle = oracle.with_model(model);
        }
        Ok(oracle)
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.inner = self.inner.with_model(model);
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        self.inner.model()
    }
}

#[async_trait]
impl TextCompletion for GrokOracle {
    async fn complete(&self, prompt: &str) -> OracleResult<String> {
        self.inner.chat(prompt).await
    }

    fn provider_name(&self) -> &str {
        "grok"
    }
}
