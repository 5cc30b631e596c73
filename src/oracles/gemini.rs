//! Google Gemini adapter.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, OracleResult};
use crate::oracles::TextCompletion;

const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini-backed oracle using the generateContent API.
#[derive(Clone)]
pub struct GeminiOracle {
    client: Client,
    api_key: SecretString,
    model: String,
}

impl GeminiOracle {
    /// Create an adapter with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from `GOOGLE_API_KEY`, honoring `GEMINI_API_MODEL`.
    pub fn from_env() -> OracleResult<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| OracleError::Config {
            reason: "GOOGLE_API_KEY environment variable not set".to_string(),
        })?;
        let mut oracle = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_API_MODEL") {
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
impl TextCompletion for GeminiOracle {
    async fn complete(&self, prompt: &str) -> OracleResult<String> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            contents: Vec<Content<'a>>,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{BASE_URL}/models/{}:generateContent",
                self.model
            ))
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Api(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::MalformedResponse {
                reason: format!("generateContent returned {status}: {body}"),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Api(Box::new(e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
