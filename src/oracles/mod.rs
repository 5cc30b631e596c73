//! Oracle adapters for hosted model providers.
//!
//! All four providers are interchangeable: each one only knows how to
//! turn a prompt into completion text, and the shared [`Oracle`]
//! implementation layers the prompt building and response parsing from
//! [`crate::convert::prompts`] on top. Swapping providers changes
//! nothing about crawl or conversion behavior.

pub mod claude;
pub mod gemini;
pub mod grok;
pub mod openai;

pub use claude::ClaudeOracle;
pub use gemini::GeminiOracle;
pub use grok::GrokOracle;
pub use openai::OpenAiOracle;

use async_trait::async_trait;

use crate::convert::prompts::{
    format_extraction_prompt, format_schema_prompt, parse_extraction_response,
    parse_schema_response,
};
use crate::error::{OracleError, OracleResult};
use crate::traits::oracle::{CandidateRecord, Oracle};
use crate::types::{page::RawPageRecord, schema::Schema};

/// Token budget for a single completion.
pub(crate) const MAX_COMPLETION_TOKENS: u32 = 4000;

/// Plain text completion seam each provider implements.
///
/// Crate-private so every `Oracle` built from it goes through the same
/// prompts and parsers.
#[async_trait]
pub(crate) trait TextCompletion: Send + Sync {
    /// Generate completion text for a prompt.
    async fn complete(&self, prompt: &str) -> OracleResult<String>;

    /// Provider name for logging.
    fn provider_name(&self) -> &str;
}

// A blanket `impl<T: TextCompletion> Oracle for T` would conflict with
// the mock's direct Oracle impl, so each provider gets the shared
// prompt-and-parse layering through this macro instead.
macro_rules! impl_oracle_via_completion {
    ($provider:ty) => {
        #[async_trait]
        impl Oracle for $provider {
            async fn infer_schema(
                &self,
                sample: &[RawPageRecord],
                total_pages: usize,
            ) -> OracleResult<Schema> {
                let prompt = format_schema_prompt(sample, total_pages);
                let response = self.complete(&prompt).await?;
                parse_schema_response(&response)
            }

            async fn extract(
                &self,
                page: &RawPageRecord,
                schema: &Schema,
            ) -> OracleResult<CandidateRecord> {
                let prompt = format_extraction_prompt(page, schema);
                let response = self.complete(&prompt).await?;
                parse_extraction_response(&response)
            }

            fn name(&self) -> &str {
                self.provider_name()
            }
        }
    };
}

impl_oracle_via_completion!(ClaudeOracle);
impl_oracle_via_completion!(GeminiOracle);
impl_oracle_via_completion!(GrokOracle);
impl_oracle_via_completion!(OpenAiOracle);

/// Construct an oracle by provider name, reading credentials from the
/// environment (`gemini`, `claude`, `openai`, or `grok`).
pub fn for_provider(name: &str) -> OracleResult<Box<dyn Oracle>> {
    match name.to_ascii_lowercase().as_str() {
        "gemini" => Ok(Box::new(GeminiOracle::from_env()?)),
        "claude" => Ok(Box::new(ClaudeOracle::from_env()?)),
        "openai" => Ok(Box::new(OpenAiOracle::from_env()?)),
        "grok" => Ok(Box::new(GrokOracle::from_env()?)),
        other => Err(OracleError::Config {
            reason: format!("unknown provider: {other} (use gemini, claude, openai, or grok)"),
        }),
    }
}
