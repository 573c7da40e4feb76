//! Provider backends: one module per vendor, one trait over all of them.
//!
//! Each backend owns three things: the provider-specific request shape that
//! embeds the PDF bytes natively (no rasterisation anywhere), the parsing of
//! that vendor's response envelope into plain text, and the classification
//! of its error bodies. Classification matters because exactly one failure
//! mode is recoverable — the token/context-limit rejection — and each vendor
//! spells it differently. The classifiers are pure functions over
//! `(status, body)` so they can be unit-tested without a network.

use crate::config::{EffectiveConfig, Provider};
use crate::error::FluffCutterError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub mod anthropic;
pub mod openai;
pub mod openrouter;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;

/// Output budget for the analysis completion.
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Whole-request timeout for a provider call. Large PDFs upload slowly and
/// frontier models think slowly; five minutes covers both.
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(300);

/// A multimodal LLM backend that can analyze a PDF natively.
#[async_trait]
pub trait PaperProvider: Send + Sync {
    /// Human-readable vendor name ("OpenAI", "Anthropic", "OpenRouter").
    fn provider_name(&self) -> &'static str;

    /// The model this instance will call.
    fn model(&self) -> &str;

    /// Send the PDF and prompt, returning the model's analysis as text.
    async fn analyze_paper(
        &self,
        pdf_base64: &str,
        filename: &str,
        prompt: &str,
    ) -> Result<String, FluffCutterError>;

    /// `"Anthropic (claude-opus-4-5)"` — for status lines and the footer.
    fn model_info(&self) -> String {
        format!("{} ({})", self.provider_name(), self.model())
    }
}

/// Construct the backend selected by the effective configuration.
pub fn build_provider(
    config: &EffectiveConfig,
) -> Result<Box<dyn PaperProvider>, FluffCutterError> {
    let client = reqwest::Client::builder()
        .timeout(ANALYSIS_TIMEOUT)
        .build()
        .map_err(|e| FluffCutterError::Network {
            provider: config.provider.key().to_string(),
            reason: e.to_string(),
        })?;

    let key = config.api_key.clone();
    let model = config.model.clone();
    Ok(match config.provider {
        Provider::OpenAi => Box::new(OpenAiProvider::new(client, key, model)),
        Provider::Anthropic => Box::new(AnthropicProvider::new(client, key, model)),
        Provider::OpenRouter => Box::new(OpenRouterProvider::new(client, key, model)),
    })
}

// ── Shared wire helpers ──────────────────────────────────────────────────

/// `data:application/pdf;base64,...` — the file encoding OpenAI and
/// OpenRouter both expect.
pub(crate) fn pdf_data_url(pdf_base64: &str) -> String {
    format!("data:application/pdf;base64,{pdf_base64}")
}

/// The `{"error": {...}}` envelope all three vendors use for failures.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// A failure body reduced to the parts the classifiers look at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ApiFailure {
    pub message: String,
    /// Vendor error code or type, lowercased; empty when absent.
    pub code: String,
}

/// Pull message and code out of an error body, falling back to the raw body
/// (truncated) when it is not the standard envelope.
pub(crate) fn parse_failure(body: &str) -> ApiFailure {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(err) = envelope.error {
            let code = err
                .code
                .map(|c| match c {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .or(err.kind)
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !err.message.is_empty() || !code.is_empty() {
                return ApiFailure {
                    message: err.message,
                    code,
                };
            }
        }
    }
    let mut message = body.trim().to_string();
    if message.len() > 300 {
        message.truncate(300);
        message.push('…');
    }
    ApiFailure {
        message,
        code: String::new(),
    }
}

/// Auth classification shared by every vendor: 401/403 never recover.
pub(crate) fn auth_error(provider: &'static str, status: u16, failure: &ApiFailure) -> Option<FluffCutterError> {
    (status == 401 || status == 403).then(|| FluffCutterError::Auth {
        provider: provider.to_string(),
        detail: failure.message.clone(),
    })
}
