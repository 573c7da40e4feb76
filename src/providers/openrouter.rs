//! OpenRouter backend: chat completions with a `file` content part.
//!
//! OpenRouter is the superset path. The model field is an arbitrary
//! `vendor/model` gateway identifier, and the gateway handles PDF ingestion
//! for every hosted model — natively where the model supports it, via its
//! own parsing otherwise.

use super::{auth_error, parse_failure, pdf_data_url, PaperProvider};
use crate::error::FluffCutterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const PROVIDER: &str = "OpenRouter";

pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentPart<'a> {
    Text { text: &'a str },
    File { file: FilePart<'a> },
}

#[derive(Serialize)]
struct FilePart<'a> {
    filename: &'a str,
    file_data: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Map an OpenRouter error response to the library taxonomy.
///
/// The gateway forwards the upstream vendor's message, so the token-limit
/// wording varies per model; match the common phrasings plus 413.
fn classify_error(status: u16, body: &str) -> FluffCutterError {
    let failure = parse_failure(body);
    if let Some(auth) = auth_error(PROVIDER, status, &failure) {
        return auth;
    }

    let msg = failure.message.to_ascii_lowercase();
    let token_limit = status == 413
        || failure.code == "context_length_exceeded"
        || msg.contains("context length")
        || msg.contains("maximum context")
        || msg.contains("prompt is too long")
        || (msg.contains("token") && (msg.contains("exceed") || msg.contains("too large")));
    if token_limit {
        return FluffCutterError::TokenLimit {
            provider: PROVIDER.to_string(),
            detail: failure.message,
        };
    }

    FluffCutterError::Api {
        provider: PROVIDER.to_string(),
        status,
        message: failure.message,
    }
}

#[async_trait]
impl PaperProvider for OpenRouterProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze_paper(
        &self,
        pdf_base64: &str,
        filename: &str,
        prompt: &str,
    ) -> Result<String, FluffCutterError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::File {
                        file: FilePart {
                            filename,
                            file_data: pdf_data_url(pdf_base64),
                        },
                    },
                ],
            }],
        };

        debug!(model = %self.model, "sending OpenRouter chat request");
        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FluffCutterError::Network {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FluffCutterError::Network {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            warn!(%status, "OpenRouter API error");
            return Err(classify_error(status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| FluffCutterError::MalformedResponse {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FluffCutterError::MalformedResponse {
                provider: PROVIDER.to_string(),
                detail: "response contained no choices".to_string(),
            })
    }
}
